//! Events emitted by the simulation
//!
//! The core appends to an [`EventLog`] during a tick; the driver drains it
//! afterwards and routes events to UI, audio or telemetry.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::shop::ItemKind;

/// What dealt damage to an enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DamageSource {
    Projectile { weapon_id: String },
    Explosion { weapon_id: String },
    Drone { weapon_id: String },
    /// Kamikaze contact with the player
    Contact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    DamageApplied {
        enemy_id: u32,
        amount: f32,
        remaining_hp: f32,
        crit: bool,
        source: DamageSource,
    },
    EnemyKilled {
        enemy_id: u32,
        def_id: String,
        pos: Vec2,
        xp_multiplier: f32,
    },
    PlayerDamaged {
        amount: f32,
        remaining_hp: f32,
    },
    ExperienceGained {
        amount: f32,
        level: u32,
        xp: f32,
    },
    /// Gained while a level-up was pending; intentionally not queued
    ExperienceDropped {
        amount: f32,
    },
    LevelUpTriggered {
        level: u32,
        next_threshold: f32,
    },
    ShopOpened {
        card_count: usize,
    },
    ShopRerolled {
        cost: u32,
    },
    ItemGained {
        id: String,
        kind: ItemKind,
    },
    ItemLeveled {
        id: String,
        kind: ItemKind,
        level: u32,
    },
    ShopClosed {
        skipped: bool,
    },
    PlayerDied,
}

/// Per-frame event buffer
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take all buffered events, oldest first
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Count events matching a predicate (handy in tests and HUD code)
    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_log() {
        let mut log = EventLog::new();
        log.push(GameEvent::PlayerDied);
        log.push(GameEvent::ShopClosed { skipped: true });
        assert_eq!(log.count(|e| matches!(e, GameEvent::PlayerDied)), 1);
        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
    }
}
