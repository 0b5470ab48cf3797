//! Experience accrual and level thresholds

use serde::{Deserialize, Serialize};

use crate::config::LevelingConfig;
use crate::events::{EventLog, GameEvent};

/// XP needed to finish `level` (linear curve)
pub fn xp_for_level(level: u32, config: &LevelingConfig) -> f32 {
    config.base + config.per_level * level.saturating_sub(1) as f32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XpGain {
    /// A level-up is pending; the amount was dropped
    Rejected,
    Accrued,
    LeveledUp { level: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelingSystem {
    level: u32,
    xp: f32,
    threshold: f32,
    pending: bool,
    config: LevelingConfig,
}

impl LevelingSystem {
    pub fn new(config: LevelingConfig) -> Self {
        Self {
            level: 1,
            xp: 0.0,
            threshold: xp_for_level(1, &config),
            pending: false,
            config,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Progress toward the current threshold
    pub fn xp(&self) -> f32 {
        self.xp
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Add gem experience. At most one threshold is crossed per call and the
    /// surplus carries into the new level.
    pub fn add_experience(&mut self, amount: f32, events: &mut EventLog) -> XpGain {
        if self.pending {
            log::debug!("Dropped {:.1} xp while level-up pending", amount);
            events.push(GameEvent::ExperienceDropped { amount });
            return XpGain::Rejected;
        }
        if !(amount > 0.0 && amount.is_finite()) {
            return XpGain::Accrued;
        }

        self.xp += amount;
        events.push(GameEvent::ExperienceGained {
            amount,
            level: self.level,
            xp: self.xp,
        });
        self.try_level_up(events)
    }

    /// Clear the pending flag after the shop closes. Returns true when the
    /// carried surplus immediately triggers the next level-up.
    pub fn resolve_pending(&mut self, events: &mut EventLog) -> bool {
        self.pending = false;
        matches!(self.try_level_up(events), XpGain::LeveledUp { .. })
    }

    fn try_level_up(&mut self, events: &mut EventLog) -> XpGain {
        if self.xp < self.threshold {
            return XpGain::Accrued;
        }
        self.xp -= self.threshold;
        self.level += 1;
        self.threshold = xp_for_level(self.level, &self.config);
        self.pending = true;
        log::info!(
            "Level up -> {} (carried {:.1}, next {:.0})",
            self.level,
            self.xp,
            self.threshold
        );
        events.push(GameEvent::LevelUpTriggered {
            level: self.level,
            next_threshold: self.threshold,
        });
        XpGain::LeveledUp { level: self.level }
    }
}
