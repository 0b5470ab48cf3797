//! Deterministic simulation module
//!
//! All combat and progression logic lives here. This module must be pure and
//! deterministic:
//! - Seeded RNG only (one `Pcg32` owned by `GameState`)
//! - Stable iteration order (spawn / acquisition / definition order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod enemies;
pub mod gem;
pub mod leveling;
pub mod passives;
pub mod player;
pub mod pool;
pub mod projectile;
pub mod shop;
pub mod spawner;
pub mod state;
pub mod stats;
pub mod tick;
pub mod weapons;

pub use collision::{Bounds, circles_overlap};
pub use enemies::{DamageOutcome, Enemy, EnemyState, EnemySystem};
pub use gem::ExperienceGem;
pub use leveling::{LevelingSystem, XpGain, xp_for_level};
pub use passives::{PassiveInstance, PassiveSystem};
pub use player::{PlayerPort, PlayerState};
pub use pool::{EntityPool, PoolHandle, Pooled};
pub use projectile::{Projectile, ProjectileOwner};
pub use shop::{
    Candidate, ItemKind, Rarity, RarityTable, Shop, ShopCard, Upgrade, build_candidate_pool,
    compute_rarity_weights, generate_cards, pick_tier,
};
pub use spawner::{EnemySpawner, NoObstacles, ObstacleFn, ObstacleMap, ObstacleQuery, SpawnTable};
pub use state::{GamePhase, GameState};
pub use stats::{BuffSnapshot, Effect, StatKey, WeaponStats, compose_weapon_stats};
pub use tick::{TickInput, tick};
pub use weapons::{WeaponInstance, WeaponPhase, WeaponSystem};
