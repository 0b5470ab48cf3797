//! Stat keys, modifiers and the weapon stat composition pipeline
//!
//! Composition order is fixed:
//! 1. Base stats from the weapon definition
//! 2. Level-up modifiers, in definition order, scaled by `level - 1`
//! 3. Passive buffs: summed flat added, then summed percent multiplied
//! 4. Floors and clamps (fire interval floor, crit chance in [0, 1])

use serde::{Deserialize, Serialize};

/// Every stat a modifier or buff can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Damage,
    FireInterval,
    ProjectileSpeed,
    Range,
    Piercing,
    CritChance,
    CritMultiplier,
    ProjectileCount,
    SpreadAngle,
    BlastRadius,
    OrbitRadius,
    OrbitSpeed,
    /// Player stat: shifts shop rarity weights
    Luck,
    /// Player stat: scales the gem attraction radius
    Magnet,
}

impl StatKey {
    pub const COUNT: usize = 14;

    pub const ALL: [StatKey; StatKey::COUNT] = [
        StatKey::Damage,
        StatKey::FireInterval,
        StatKey::ProjectileSpeed,
        StatKey::Range,
        StatKey::Piercing,
        StatKey::CritChance,
        StatKey::CritMultiplier,
        StatKey::ProjectileCount,
        StatKey::SpreadAngle,
        StatKey::BlastRadius,
        StatKey::OrbitRadius,
        StatKey::OrbitSpeed,
        StatKey::Luck,
        StatKey::Magnet,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::Damage => "damage",
            StatKey::FireInterval => "fire_interval",
            StatKey::ProjectileSpeed => "projectile_speed",
            StatKey::Range => "range",
            StatKey::Piercing => "piercing",
            StatKey::CritChance => "crit_chance",
            StatKey::CritMultiplier => "crit_multiplier",
            StatKey::ProjectileCount => "projectile_count",
            StatKey::SpreadAngle => "spread_angle",
            StatKey::BlastRadius => "blast_radius",
            StatKey::OrbitRadius => "orbit_radius",
            StatKey::OrbitSpeed => "orbit_speed",
            StatKey::Luck => "luck",
            StatKey::Magnet => "magnet",
        }
    }
}

/// How a level-up modifier scales with level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierMode {
    /// Adds `increment * (level - 1)`
    Flat,
    /// Multiplies by `1 + increment / 100 * (level - 1)`
    Percent,
}

/// Per-stat level-up curve entry from a weapon definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelModifier {
    pub stat: StatKey,
    pub mode: ModifierMode,
    pub increment: f32,
}

impl LevelModifier {
    /// Apply this modifier for a weapon at `level` (1-based)
    pub fn apply(&self, value: f32, level: u32) -> f32 {
        let steps = level.saturating_sub(1) as f32;
        match self.mode {
            ModifierMode::Flat => value + self.increment * steps,
            ModifierMode::Percent => value * (1.0 + (self.increment / 100.0) * steps),
        }
    }
}

/// A passive's contribution to one stat, per passive level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Flat(f32),
    Percent(f32),
}

/// The computed stat set of a weapon instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeaponStats {
    pub damage: f32,
    /// Seconds between shots
    pub fire_interval: f32,
    pub projectile_speed: f32,
    pub range: f32,
    /// Extra enemies a projectile may pass through
    pub piercing: f32,
    /// Probability in [0, 1]
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    /// Shots per volley (spread) or ring size (drone)
    pub projectile_count: f32,
    /// Total fan angle in degrees (spread)
    pub spread_angle: f32,
    pub blast_radius: f32,
    pub orbit_radius: f32,
    /// Radians per second (drone)
    pub orbit_speed: f32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            damage: 10.0,
            fire_interval: 1.0,
            projectile_speed: 300.0,
            range: 400.0,
            piercing: 0.0,
            crit_chance: 0.0,
            crit_multiplier: 2.0,
            projectile_count: 1.0,
            spread_angle: 0.0,
            blast_radius: 0.0,
            orbit_radius: 0.0,
            orbit_speed: 0.0,
        }
    }
}

impl WeaponStats {
    /// Mutable access to a weapon stat; `None` for player-only stats
    pub fn get_mut(&mut self, key: StatKey) -> Option<&mut f32> {
        match key {
            StatKey::Damage => Some(&mut self.damage),
            StatKey::FireInterval => Some(&mut self.fire_interval),
            StatKey::ProjectileSpeed => Some(&mut self.projectile_speed),
            StatKey::Range => Some(&mut self.range),
            StatKey::Piercing => Some(&mut self.piercing),
            StatKey::CritChance => Some(&mut self.crit_chance),
            StatKey::CritMultiplier => Some(&mut self.crit_multiplier),
            StatKey::ProjectileCount => Some(&mut self.projectile_count),
            StatKey::SpreadAngle => Some(&mut self.spread_angle),
            StatKey::BlastRadius => Some(&mut self.blast_radius),
            StatKey::OrbitRadius => Some(&mut self.orbit_radius),
            StatKey::OrbitSpeed => Some(&mut self.orbit_speed),
            StatKey::Luck | StatKey::Magnet => None,
        }
    }

    pub fn get(&self, key: StatKey) -> Option<f32> {
        let mut copy = *self;
        copy.get_mut(key).map(|v| *v)
    }

    /// Whole projectiles per volley (at least one)
    pub fn volley_size(&self) -> u32 {
        self.projectile_count.round().max(1.0) as u32
    }

    /// Whole piercing charges
    pub fn pierce_count(&self) -> u32 {
        self.piercing.floor().max(0.0) as u32
    }
}

/// Read-only summary of all passive modifiers, keyed by stat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffSnapshot {
    flat: [f32; StatKey::COUNT],
    percent: [f32; StatKey::COUNT],
    /// Bumped by the passive system on every change
    pub revision: u64,
}

impl Default for BuffSnapshot {
    fn default() -> Self {
        Self {
            flat: [0.0; StatKey::COUNT],
            percent: [0.0; StatKey::COUNT],
            revision: 0,
        }
    }
}

impl BuffSnapshot {
    /// Empty snapshot tagged with `revision`
    pub fn with_revision(revision: u64) -> Self {
        Self {
            revision,
            ..Self::default()
        }
    }

    /// Accumulate one effect, scaled by the contributing passive's level
    pub fn add(&mut self, stat: StatKey, effect: Effect, scale: f32) {
        match effect {
            Effect::Flat(amount) => self.flat[stat.index()] += amount * scale,
            Effect::Percent(amount) => self.percent[stat.index()] += amount * scale,
        }
    }

    pub fn flat(&self, stat: StatKey) -> f32 {
        self.flat[stat.index()]
    }

    pub fn percent(&self, stat: StatKey) -> f32 {
        self.percent[stat.index()]
    }

    /// `(value + flat_sum) * (1 + percent_sum / 100)`
    #[inline]
    pub fn apply(&self, stat: StatKey, value: f32) -> f32 {
        (value + self.flat(stat)) * (1.0 + self.percent(stat) / 100.0)
    }
}

/// Compose the effective stats of a weapon at `level` under `buffs`
pub fn compose_weapon_stats(
    base: &WeaponStats,
    level_mods: &[LevelModifier],
    level: u32,
    buffs: &BuffSnapshot,
    min_fire_interval: f32,
) -> WeaponStats {
    let mut stats = *base;

    for modifier in level_mods {
        if let Some(value) = stats.get_mut(modifier.stat) {
            *value = modifier.apply(*value, level);
        }
    }

    for key in StatKey::ALL {
        if let Some(value) = stats.get_mut(key) {
            *value = buffs.apply(key, *value);
        }
    }

    stats.fire_interval = stats.fire_interval.max(min_fire_interval);
    stats.crit_chance = stats.crit_chance.clamp(0.0, 1.0);
    stats.piercing = stats.piercing.max(0.0);
    stats.projectile_count = stats.projectile_count.max(1.0);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn damage_base() -> WeaponStats {
        WeaponStats {
            damage: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_flat_level_then_percent_buff() {
        let mods = [LevelModifier {
            stat: StatKey::Damage,
            mode: ModifierMode::Flat,
            increment: 2.0,
        }];
        let no_buffs = BuffSnapshot::default();
        let stats = compose_weapon_stats(&damage_base(), &mods, 3, &no_buffs, 0.05);
        assert!((stats.damage - 14.0).abs() < 1e-5);

        let mut buffs = BuffSnapshot::default();
        buffs.add(StatKey::Damage, Effect::Percent(20.0), 1.0);
        let stats = compose_weapon_stats(&damage_base(), &mods, 3, &buffs, 0.05);
        assert!((stats.damage - 16.8).abs() < 1e-4);
    }

    #[test]
    fn test_with_revision_starts_empty() {
        let mut buffs = BuffSnapshot::with_revision(7);
        assert_eq!(buffs.revision, 7);
        assert_eq!(buffs.flat(StatKey::Damage), 0.0);
        assert_eq!(buffs.percent(StatKey::Damage), 0.0);

        buffs.add(StatKey::Damage, Effect::Flat(3.0), 2.0);
        assert!((buffs.apply(StatKey::Damage, 10.0) - 16.0).abs() < 1e-5);
    }

    #[test]
    fn test_percent_level_modifier() {
        let mods = [LevelModifier {
            stat: StatKey::Damage,
            mode: ModifierMode::Percent,
            increment: 50.0,
        }];
        let stats = compose_weapon_stats(&damage_base(), &mods, 3, &BuffSnapshot::default(), 0.05);
        // 10 * (1 + 0.5 * 2)
        assert!((stats.damage - 20.0).abs() < 1e-5);
    }

    #[test]
    fn test_level_one_ignores_modifiers() {
        let mods = [LevelModifier {
            stat: StatKey::Range,
            mode: ModifierMode::Flat,
            increment: 100.0,
        }];
        let stats = compose_weapon_stats(&damage_base(), &mods, 1, &BuffSnapshot::default(), 0.05);
        assert_eq!(stats.range, WeaponStats::default().range);
    }

    #[test]
    fn test_flat_buffs_apply_before_percent() {
        let mut buffs = BuffSnapshot::default();
        buffs.add(StatKey::Damage, Effect::Percent(100.0), 1.0);
        buffs.add(StatKey::Damage, Effect::Flat(5.0), 1.0);
        let stats = compose_weapon_stats(&damage_base(), &[], 1, &buffs, 0.05);
        assert!((stats.damage - 30.0).abs() < 1e-5);
    }

    #[test]
    fn test_fire_interval_floor() {
        let mut buffs = BuffSnapshot::default();
        buffs.add(StatKey::FireInterval, Effect::Percent(-99.0), 1.0);
        let stats = compose_weapon_stats(&WeaponStats::default(), &[], 1, &buffs, 0.05);
        assert!((stats.fire_interval - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_player_stats_do_not_touch_weapons() {
        let mut buffs = BuffSnapshot::default();
        buffs.add(StatKey::Luck, Effect::Flat(50.0), 1.0);
        let stats = compose_weapon_stats(&WeaponStats::default(), &[], 1, &buffs, 0.05);
        assert_eq!(stats, WeaponStats::default());
        assert!((buffs.apply(StatKey::Luck, 0.0) - 50.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_buff_order_is_irrelevant(
            effects in prop::collection::vec((0usize..2, -50.0f32..50.0), 1..8),
        ) {
            let mut forward = BuffSnapshot::default();
            let mut backward = BuffSnapshot::default();
            let to_effect = |(kind, amount): (usize, f32)| {
                if kind == 0 { Effect::Flat(amount) } else { Effect::Percent(amount) }
            };
            for e in effects.iter().copied() {
                forward.add(StatKey::Damage, to_effect(e), 1.0);
            }
            for e in effects.iter().rev().copied() {
                backward.add(StatKey::Damage, to_effect(e), 1.0);
            }
            let a = compose_weapon_stats(&damage_base(), &[], 2, &forward, 0.05);
            let b = compose_weapon_stats(&damage_base(), &[], 2, &backward, 0.05);
            prop_assert!((a.damage - b.damage).abs() < 1e-3);
        }
    }
}
