//! Horde Arena - combat and progression core of an arena survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (weapons, enemies, spawning, leveling, shop)
//! - `config`: Data-driven tuning with serde defaults
//! - `defs`: Validated weapon/passive/enemy definition tables
//! - `events`: Structured events emitted by the simulation
//! - `error`: Recoverable failure results

pub mod config;
pub mod defs;
pub mod error;
pub mod events;
pub mod sim;

pub use config::{Diagnostics, SimConfig};
pub use defs::Definitions;
pub use error::{CoreError, CoreResult};
pub use events::{EventLog, GameEvent};

use glam::Vec2;

/// Default tuning constants. `SimConfig::default()` mirrors these.
pub mod consts {
    /// Fixed simulation timestep used by the headless driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Pool capacities
    pub const PROJECTILE_POOL_CAPACITY: usize = 256;
    pub const ENEMY_PROJECTILE_POOL_CAPACITY: usize = 128;
    pub const GEM_POOL_CAPACITY: usize = 300;

    /// Player defaults
    pub const PLAYER_HIT_RADIUS: f32 = 16.0;
    pub const PLAYER_MAX_HP: f32 = 100.0;
    pub const PLAYER_INVULNERABILITY: f32 = 0.5;

    /// Weapon defaults
    pub const MAX_WEAPON_SLOTS: usize = 6;
    pub const MUZZLE_OFFSET: f32 = 20.0;
    pub const PROJECTILE_RADIUS: f32 = 6.0;
    pub const PROJECTILE_MAX_LIFETIME: f32 = 4.0;
    /// Fire interval floor applied after all stat composition (seconds)
    pub const MIN_FIRE_INTERVAL: f32 = 0.05;
    /// Drone collision radius
    pub const DRONE_RADIUS: f32 = 10.0;

    /// Enemy defaults
    pub const DEATH_FADE_DURATION: f32 = 0.35;
    pub const CURRENCY_PER_KILL: u32 = 1;

    /// Spawner defaults
    pub const SPAWN_INTERVAL: f32 = 1.0;
    pub const SAFE_RADIUS: f32 = 400.0;
    pub const SPAWN_RING_WIDTH: f32 = 200.0;
    pub const SPAWN_ATTEMPTS: u32 = 10;
    pub const SPAWN_FALLBACK_OFFSET: f32 = 100.0;
    pub const MAX_ACTIVE_ENEMIES: usize = 400;
    pub const SPAWN_BATCH_GROWTH_SECS: f32 = 60.0;

    /// Experience gem defaults
    pub const GEM_BASE_VALUE: f32 = 10.0;
    pub const GEM_ATTRACTION_RADIUS: f32 = 120.0;
    pub const GEM_MIN_MAGNET_SPEED: f32 = 150.0;
    pub const GEM_MAX_MAGNET_SPEED: f32 = 600.0;
    pub const GEM_PICKUP_RADIUS: f32 = 20.0;

    /// Leveling curve: xp_for_level(L) = base + per_level * (L - 1)
    pub const XP_BASE: f32 = 100.0;
    pub const XP_PER_LEVEL: f32 = 25.0;

    /// Shop defaults
    pub const SHOP_CARD_COUNT: usize = 3;
    pub const REROLL_COST: u32 = 10;
    pub const MAX_PASSIVE_SLOTS: usize = 6;

    /// World bounds (half extent of the square arena)
    pub const WORLD_HALF_EXTENT: f32 = 4000.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector pointing along `theta`
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle of a vector (radians, atan2 convention)
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Convert polar (r, theta) around `center` to cartesian
#[inline]
pub fn polar_offset(center: Vec2, r: f32, theta: f32) -> Vec2 {
    center + direction_from_angle(theta) * r
}
