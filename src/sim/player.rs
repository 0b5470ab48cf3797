//! Player collaborator boundary
//!
//! Movement and aiming are driven from outside the core. The simulation only
//! reads position/aim/invulnerability and goes through [`PlayerPort`] to mutate
//! HP and currency.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::PlayerConfig;

/// What the core needs from the player
pub trait PlayerPort {
    fn position(&self) -> Vec2;
    /// Unit aim vector (never zero)
    fn aim(&self) -> Vec2;
    fn is_invulnerable(&self) -> bool;
    fn hp(&self) -> f32;
    fn currency(&self) -> u32;
    /// Deduct `amount`; returns false and changes nothing if unaffordable
    fn spend(&mut self, amount: u32) -> bool;
    fn earn(&mut self, amount: u32);
    /// Apply damage; returns the damage actually taken
    fn take_damage(&mut self, amount: f32) -> f32;
}

/// Default player collaborator owned by `GameState`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub pos: Vec2,
    aim: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// Seconds of invulnerability remaining
    pub invulnerable: f32,
    /// Invulnerability granted per hit
    pub invulnerability_window: f32,
    pub currency: u32,
}

impl PlayerState {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            pos: Vec2::ZERO,
            aim: Vec2::X,
            hp: config.max_hp,
            max_hp: config.max_hp,
            invulnerable: 0.0,
            invulnerability_window: config.invulnerability,
            currency: 0,
        }
    }

    /// Set the aim direction; a zero vector keeps the previous aim
    pub fn set_aim(&mut self, aim: Vec2) {
        if let Some(dir) = aim.try_normalize() {
            self.aim = dir;
        }
    }

    pub fn tick_timers(&mut self, dt: f32) {
        self.invulnerable = (self.invulnerable - dt).max(0.0);
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

impl PlayerPort for PlayerState {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn aim(&self) -> Vec2 {
        self.aim
    }

    fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0.0
    }

    fn hp(&self) -> f32 {
        self.hp
    }

    fn currency(&self) -> u32 {
        self.currency
    }

    fn spend(&mut self, amount: u32) -> bool {
        if self.currency < amount {
            return false;
        }
        self.currency -= amount;
        true
    }

    fn earn(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(amount);
    }

    fn take_damage(&mut self, amount: f32) -> f32 {
        if self.is_invulnerable() || self.is_dead() || amount <= 0.0 {
            return 0.0;
        }
        let taken = amount.min(self.hp);
        self.hp -= taken;
        self.invulnerable = self.invulnerability_window;
        taken
    }
}
