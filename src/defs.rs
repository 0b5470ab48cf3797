//! Static definition tables: weapons, passives and enemies
//!
//! Definitions are parsed once from JSON into a canonical schema and validated
//! up front. Malformed entries are rejected with
//! [`CoreError::InvalidDefinition`]; nothing downstream second-guesses a field.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::sim::shop::Rarity;
use crate::sim::stats::{Effect, LevelModifier, StatKey, WeaponStats};

/// Bundled definition tables
const BUILTIN_DEFINITIONS: &str = include_str!("../assets/definitions.json");

/// Firing pattern of a weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    /// Single shot along the aim vector
    Forward,
    /// `projectile_count` shots fanned symmetrically over `spread_angle`
    Spread,
    /// Slow bomb flown to `aim * range`, exploding on arrival
    Aoe,
    /// Ring of orbiting drones around the player
    Drone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeaponDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub behavior: Behavior,
    #[serde(default)]
    pub rarity: Rarity,
    pub max_level: u32,
    pub base: WeaponStats,
    #[serde(default)]
    pub level_up: Vec<LevelModifier>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassiveEffect {
    pub stat: StatKey,
    pub effect: Effect,
}

#[derive(Debug, Clone)]
pub struct PassiveDef {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    pub max_level: u32,
    /// Each effect is multiplied by the passive's level
    pub effects: Vec<PassiveEffect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangedAttack {
    pub range: f32,
    /// Seconds between shots
    pub cooldown: f32,
    pub projectile_speed: f32,
    pub damage: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnemyDef {
    pub id: String,
    pub name: String,
    pub hp: f32,
    pub speed: f32,
    pub size: f32,
    /// Contact damage
    pub damage: f32,
    #[serde(default = "one")]
    pub xp_multiplier: f32,
    /// Relative spawn weight
    pub spawn_rate: f32,
    /// Fractional HP/speed variance applied at spawn (0.1 = ±10%)
    #[serde(default)]
    pub jitter: f32,
    #[serde(default)]
    pub ranged: Option<RangedAttack>,
}

fn one() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPassiveEffect {
    stat: StatKey,
    #[serde(default)]
    flat: Option<f32>,
    #[serde(default)]
    percent: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPassiveDef {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    rarity: Rarity,
    max_level: u32,
    effects: Vec<RawPassiveEffect>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDefinitions {
    #[serde(default)]
    weapons: Vec<WeaponDef>,
    #[serde(default)]
    passives: Vec<RawPassiveDef>,
    #[serde(default)]
    enemies: Vec<EnemyDef>,
}

/// Validated definition tables (read-only to the core)
#[derive(Debug, Clone)]
pub struct Definitions {
    pub weapons: Vec<WeaponDef>,
    pub passives: Vec<PassiveDef>,
    pub enemies: Vec<EnemyDef>,
}

impl Definitions {
    /// The tables bundled with the crate
    pub fn builtin() -> CoreResult<Self> {
        Self::from_json_str(BUILTIN_DEFINITIONS)
    }

    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let raw: RawDefinitions = serde_json::from_str(json).map_err(|e| {
            CoreError::invalid_definition("<document>", format!("failed to parse: {}", e))
        })?;

        let passives = raw
            .passives
            .into_iter()
            .map(resolve_passive)
            .collect::<CoreResult<Vec<_>>>()?;

        let defs = Self {
            weapons: raw.weapons,
            passives,
            enemies: raw.enemies,
        };
        defs.validate()?;
        log::info!(
            "Loaded {} weapons, {} passives, {} enemies",
            defs.weapons.len(),
            defs.passives.len(),
            defs.enemies.len()
        );
        Ok(defs)
    }

    pub fn weapon(&self, id: &str) -> Option<&WeaponDef> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn passive(&self, id: &str) -> Option<&PassiveDef> {
        self.passives.iter().find(|p| p.id == id)
    }

    pub fn enemy(&self, id: &str) -> Option<&EnemyDef> {
        self.enemies.iter().find(|e| e.id == id)
    }

    fn validate(&self) -> CoreResult<()> {
        // Weapons and passives share the shop namespace, so ids must be unique across both
        let mut seen = HashSet::new();
        for id in self
            .weapons
            .iter()
            .map(|w| &w.id)
            .chain(self.passives.iter().map(|p| &p.id))
        {
            if !seen.insert(id.as_str()) {
                return Err(CoreError::invalid_definition(id, "duplicate item id"));
            }
        }
        let mut seen_enemies = HashSet::new();
        for enemy in &self.enemies {
            if !seen_enemies.insert(enemy.id.as_str()) {
                return Err(CoreError::invalid_definition(&enemy.id, "duplicate enemy id"));
            }
        }

        self.weapons.iter().try_for_each(validate_weapon)?;
        for passive in &self.passives {
            if passive.max_level == 0 {
                return Err(CoreError::invalid_definition(&passive.id, "max_level must be >= 1"));
            }
        }
        self.enemies.iter().try_for_each(validate_enemy)?;

        if !self.enemies.is_empty() && self.enemies.iter().all(|e| e.spawn_rate == 0.0) {
            return Err(CoreError::invalid_definition(
                "<enemies>",
                "total spawn weight must be positive",
            ));
        }
        Ok(())
    }
}

fn resolve_passive(raw: RawPassiveDef) -> CoreResult<PassiveDef> {
    let effects = raw
        .effects
        .iter()
        .map(|e| {
            let effect = match (e.flat, e.percent) {
                (Some(amount), None) => Effect::Flat(amount),
                (None, Some(amount)) => Effect::Percent(amount),
                _ => {
                    return Err(CoreError::invalid_definition(
                        &raw.id,
                        format!(
                            "effect on '{}' needs exactly one of 'flat' or 'percent'",
                            e.stat.as_str()
                        ),
                    ));
                }
            };
            Ok(PassiveEffect {
                stat: e.stat,
                effect,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(PassiveDef {
        id: raw.id,
        name: raw.name,
        description: raw.description,
        rarity: raw.rarity,
        max_level: raw.max_level,
        effects,
    })
}

fn validate_weapon(weapon: &WeaponDef) -> CoreResult<()> {
    let fail = |reason: &str| Err(CoreError::invalid_definition(&weapon.id, reason));
    if weapon.max_level == 0 {
        return fail("max_level must be >= 1");
    }
    if weapon.base.fire_interval <= 0.0 {
        return fail("fire_interval must be positive");
    }
    if weapon
        .level_up
        .iter()
        .any(|m| matches!(m.stat, StatKey::Luck | StatKey::Magnet))
    {
        return fail("level_up may only target weapon stats");
    }
    match weapon.behavior {
        Behavior::Forward => {}
        Behavior::Spread if weapon.base.projectile_count < 1.0 => {
            return fail("spread needs projectile_count >= 1");
        }
        Behavior::Spread => {}
        Behavior::Aoe if weapon.base.blast_radius <= 0.0 => {
            return fail("aoe needs a positive blast_radius");
        }
        Behavior::Aoe => {}
        Behavior::Drone if weapon.base.orbit_radius <= 0.0 => {
            return fail("drone needs a positive orbit_radius");
        }
        Behavior::Drone if weapon.base.projectile_count < 1.0 => {
            return fail("drone needs projectile_count >= 1");
        }
        Behavior::Drone => {}
    }
    Ok(())
}

fn validate_enemy(enemy: &EnemyDef) -> CoreResult<()> {
    let fail = |reason: &str| Err(CoreError::invalid_definition(&enemy.id, reason));
    if enemy.hp <= 0.0 {
        return fail("hp must be positive");
    }
    if enemy.speed < 0.0 || enemy.size <= 0.0 {
        return fail("speed must be >= 0 and size positive");
    }
    if enemy.spawn_rate < 0.0 || !enemy.spawn_rate.is_finite() {
        return fail("spawn_rate must be >= 0");
    }
    if !(0.0..1.0).contains(&enemy.jitter) {
        return fail("jitter must be in [0, 1)");
    }
    if let Some(ranged) = &enemy.ranged {
        if ranged.cooldown <= 0.0 || ranged.range <= 0.0 || ranged.projectile_speed <= 0.0 {
            return fail("ranged attack needs positive range, cooldown and projectile_speed");
        }
    }
    Ok(())
}
