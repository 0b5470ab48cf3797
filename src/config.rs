//! Runtime tuning loaded from JSON.
//!
//! [`SimConfig`] mirrors every constant in [`crate::consts`]. All sections use
//! `#[serde(default)]`, so a minimal document can override just the values you
//! care about and everything else falls back to the compile-time defaults.
//!
//! Debug toggles live in [`Diagnostics`], which is passed explicitly into the
//! subsystems that consult it.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{CoreError, CoreResult};
use crate::sim::collision::Bounds;
use crate::sim::shop::RarityTable;

/// Explicit diagnostics context (replaces global debug switches)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagnostics {
    /// Log every steal-oldest eviction
    pub log_pool_recycling: bool,
    /// Log every enemy spawn and spawn-position fallback
    pub log_spawns: bool,
    /// Log every damage application
    pub log_damage: bool,
    /// Log candidate pools and card draws
    pub log_shop: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub projectiles: usize,
    pub enemy_projectiles: usize,
    pub gems: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            projectiles: PROJECTILE_POOL_CAPACITY,
            enemy_projectiles: ENEMY_PROJECTILE_POOL_CAPACITY,
            gems: GEM_POOL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub hit_radius: f32,
    pub max_hp: f32,
    /// Seconds of invulnerability after taking a hit
    pub invulnerability: f32,
    pub base_luck: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            hit_radius: PLAYER_HIT_RADIUS,
            max_hp: PLAYER_MAX_HP,
            invulnerability: PLAYER_INVULNERABILITY,
            base_luck: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub max_slots: usize,
    pub muzzle_offset: f32,
    pub projectile_radius: f32,
    pub projectile_max_lifetime: f32,
    pub min_fire_interval: f32,
    pub drone_radius: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            max_slots: MAX_WEAPON_SLOTS,
            muzzle_offset: MUZZLE_OFFSET,
            projectile_radius: PROJECTILE_RADIUS,
            projectile_max_lifetime: PROJECTILE_MAX_LIFETIME,
            min_fire_interval: MIN_FIRE_INTERVAL,
            drone_radius: DRONE_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub death_fade: f32,
    pub currency_per_kill: u32,
    pub projectile_radius: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            death_fade: DEATH_FADE_DURATION,
            currency_per_kill: CURRENCY_PER_KILL,
            projectile_radius: PROJECTILE_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Seconds between spawn batches
    pub interval: f32,
    pub safe_radius: f32,
    pub ring_width: f32,
    pub attempts: u32,
    pub fallback_offset: f32,
    pub max_active_enemies: usize,
    /// Run time per extra enemy in each batch (0 disables growth)
    pub batch_growth_secs: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            interval: SPAWN_INTERVAL,
            safe_radius: SAFE_RADIUS,
            ring_width: SPAWN_RING_WIDTH,
            attempts: SPAWN_ATTEMPTS,
            fallback_offset: SPAWN_FALLBACK_OFFSET,
            max_active_enemies: MAX_ACTIVE_ENEMIES,
            batch_growth_secs: SPAWN_BATCH_GROWTH_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GemConfig {
    pub base_value: f32,
    pub attraction_radius: f32,
    pub min_magnet_speed: f32,
    pub max_magnet_speed: f32,
    pub pickup_radius: f32,
}

impl Default for GemConfig {
    fn default() -> Self {
        Self {
            base_value: GEM_BASE_VALUE,
            attraction_radius: GEM_ATTRACTION_RADIUS,
            min_magnet_speed: GEM_MIN_MAGNET_SPEED,
            max_magnet_speed: GEM_MAX_MAGNET_SPEED,
            pickup_radius: GEM_PICKUP_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelingConfig {
    pub base: f32,
    pub per_level: f32,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            base: XP_BASE,
            per_level: XP_PER_LEVEL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub card_count: usize,
    pub reroll_cost: u32,
    pub max_passive_slots: usize,
    pub rarity: RarityTable,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            card_count: SHOP_CARD_COUNT,
            reroll_cost: REROLL_COST,
            max_passive_slots: MAX_PASSIVE_SLOTS,
            rarity: RarityTable::default(),
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub pools: PoolConfig,
    pub player: PlayerConfig,
    pub weapons: WeaponConfig,
    pub enemies: EnemyConfig,
    pub spawner: SpawnerConfig,
    pub gems: GemConfig,
    pub leveling: LevelingConfig,
    pub shop: ShopConfig,
    pub world: Bounds,
    /// Weapon equipped when a run starts
    pub starting_weapon: String,
    pub diagnostics: Diagnostics,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            pools: PoolConfig::default(),
            player: PlayerConfig::default(),
            weapons: WeaponConfig::default(),
            enemies: EnemyConfig::default(),
            spawner: SpawnerConfig::default(),
            gems: GemConfig::default(),
            leveling: LevelingConfig::default(),
            shop: ShopConfig::default(),
            world: Bounds::square(WORLD_HALF_EXTENT),
            starting_weapon: "wand".to_string(),
            diagnostics: Diagnostics::default(),
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: SimConfig = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        log::info!("Loaded simulation config");
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> CoreResult<()> {
        fn positive(name: &str, value: f32) -> CoreResult<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(CoreError::Config(format!("{} must be positive, got {}", name, value)))
            }
        }
        fn non_negative(name: &str, value: f32) -> CoreResult<()> {
            if value >= 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(CoreError::Config(format!("{} must be >= 0, got {}", name, value)))
            }
        }

        if self.pools.projectiles == 0 || self.pools.enemy_projectiles == 0 || self.pools.gems == 0
        {
            return Err(CoreError::Config("pool capacities must be at least 1".into()));
        }
        if self.weapons.max_slots == 0 || self.shop.max_passive_slots == 0 {
            return Err(CoreError::Config("slot limits must be at least 1".into()));
        }
        if self.shop.card_count == 0 {
            return Err(CoreError::Config("shop.card_count must be at least 1".into()));
        }
        if self.spawner.attempts == 0 {
            return Err(CoreError::Config("spawner.attempts must be at least 1".into()));
        }

        positive("spawner.interval", self.spawner.interval)?;
        positive("weapons.min_fire_interval", self.weapons.min_fire_interval)?;
        positive("weapons.projectile_max_lifetime", self.weapons.projectile_max_lifetime)?;
        positive("leveling.base", self.leveling.base)?;
        non_negative("leveling.per_level", self.leveling.per_level)?;
        non_negative("spawner.safe_radius", self.spawner.safe_radius)?;
        non_negative("spawner.ring_width", self.spawner.ring_width)?;
        non_negative("spawner.batch_growth_secs", self.spawner.batch_growth_secs)?;
        non_negative("enemies.death_fade", self.enemies.death_fade)?;
        non_negative("player.hit_radius", self.player.hit_radius)?;
        positive("player.max_hp", self.player.max_hp)?;
        non_negative("gems.attraction_radius", self.gems.attraction_radius)?;
        non_negative("gems.pickup_radius", self.gems.pickup_radius)?;
        if self.gems.max_magnet_speed < self.gems.min_magnet_speed {
            return Err(CoreError::Config(
                "gems.max_magnet_speed must be >= gems.min_magnet_speed".into(),
            ));
        }
        if !self.world.is_valid() {
            return Err(CoreError::Config("world bounds are empty".into()));
        }
        self.shop.rarity.validate()?;
        Ok(())
    }
}
