//! Game state aggregate
//!
//! Every subsystem, pool and the single seeded RNG live here so a run is fully
//! reproducible from `(seed, config, definitions, inputs)`.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemies::EnemySystem;
use super::gem::ExperienceGem;
use super::leveling::LevelingSystem;
use super::passives::PassiveSystem;
use super::player::PlayerState;
use super::pool::EntityPool;
use super::projectile::Projectile;
use super::shop::{Inventory, Shop, Upgrade};
use super::spawner::{EnemySpawner, ObstacleMap};
use super::stats::StatKey;
use super::weapons::WeaponSystem;
use crate::config::SimConfig;
use crate::defs::Definitions;
use crate::error::{CoreError, CoreResult};
use crate::events::EventLog;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Shop open; the simulation is paused until a card is chosen or skipped
    LevelUp,
    GameOver,
}

#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub config: SimConfig,
    pub(crate) defs: Definitions,
    pub phase: GamePhase,
    pub player: PlayerState,
    pub weapons: WeaponSystem,
    pub passives: PassiveSystem,
    pub enemies: EnemySystem,
    pub spawner: EnemySpawner,
    pub leveling: LevelingSystem,
    pub shop: Shop,
    pub projectiles: EntityPool<Projectile>,
    pub enemy_projectiles: EntityPool<Projectile>,
    pub gems: EntityPool<ExperienceGem>,
    pub obstacles: ObstacleMap,
    /// Drained by the driver after each tick
    pub events: EventLog,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated seconds while playing
    pub elapsed: f32,
    pub kills: u32,
}

impl GameState {
    /// Start a run with the configured starting weapon equipped
    pub fn new(seed: u64, config: SimConfig, defs: Definitions) -> CoreResult<Self> {
        config.validate()?;
        let diag = config.diagnostics;

        let passives = PassiveSystem::new(config.shop.max_passive_slots);
        let mut weapons = WeaponSystem::new(config.weapons.clone());
        weapons.acquire(&defs, &config.starting_weapon, passives.buffs())?;

        let state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            player: PlayerState::new(&config.player),
            weapons,
            passives,
            enemies: EnemySystem::new(config.enemies.clone(), diag.log_damage),
            spawner: EnemySpawner::new(config.spawner.clone(), &defs, diag.log_spawns),
            leveling: LevelingSystem::new(config.leveling.clone()),
            shop: Shop::new(config.shop.clone(), diag.log_shop),
            projectiles: EntityPool::new("projectiles", config.pools.projectiles)
                .with_recycle_logging(diag.log_pool_recycling),
            enemy_projectiles: EntityPool::new("enemy_projectiles", config.pools.enemy_projectiles)
                .with_recycle_logging(diag.log_pool_recycling),
            gems: EntityPool::new("gems", config.pools.gems)
                .with_recycle_logging(diag.log_pool_recycling),
            obstacles: ObstacleMap::default(),
            events: EventLog::new(),
            time_ticks: 0,
            elapsed: 0.0,
            kills: 0,
            config,
            defs,
        };
        log::info!(
            "Run started: seed {}, starting weapon {}",
            seed,
            state.config.starting_weapon
        );
        Ok(state)
    }

    /// Defaults with the bundled definitions
    pub fn with_seed(seed: u64) -> CoreResult<Self> {
        Self::new(seed, SimConfig::default(), Definitions::builtin()?)
    }

    pub fn defs(&self) -> &Definitions {
        &self.defs
    }

    /// Swap in new definitions and rebuild the spawn weight table
    pub fn set_definitions(&mut self, defs: Definitions) {
        self.spawner.reload(&defs);
        self.defs = defs;
        log::info!(
            "Definitions reloaded: {} weapons, {} passives, {} enemies",
            self.defs.weapons.len(),
            self.defs.passives.len(),
            self.defs.enemies.len()
        );
    }

    /// Base luck plus the composed `Luck` buff
    pub fn luck(&self) -> f32 {
        self.config.player.base_luck + self.passives.buffs().apply(StatKey::Luck, 0.0)
    }

    /// Gem attraction radius after `Magnet` buffs
    pub fn attraction_radius(&self) -> f32 {
        self.passives
            .buffs()
            .apply(StatKey::Magnet, self.config.gems.attraction_radius)
            .max(0.0)
    }

    pub(crate) fn open_shop(&mut self) {
        let luck = self.luck();
        self.shop.open(
            &self.defs,
            &self.weapons,
            &self.passives,
            luck,
            &mut self.rng,
            &mut self.events,
        );
        self.phase = GamePhase::LevelUp;
    }

    fn require_level_up(&self) -> CoreResult<()> {
        if self.phase == GamePhase::LevelUp {
            Ok(())
        } else {
            Err(CoreError::InvalidState("no level-up in progress"))
        }
    }

    /// Apply the chosen card. On failure the shop stays open unchanged.
    pub fn select_card(&mut self, index: usize) -> CoreResult<Upgrade> {
        self.require_level_up()?;
        let upgrade = self.shop.select(
            index,
            Inventory {
                defs: &self.defs,
                weapons: &mut self.weapons,
                passives: &mut self.passives,
            },
            &mut self.events,
        )?;
        self.after_shop_closed();
        Ok(upgrade)
    }

    pub fn reroll_shop(&mut self) -> CoreResult<()> {
        self.require_level_up()?;
        let luck = self.luck();
        self.shop.reroll(
            &mut self.player,
            &self.defs,
            &self.weapons,
            &self.passives,
            luck,
            &mut self.rng,
            &mut self.events,
        )
    }

    pub fn skip_shop(&mut self) -> CoreResult<()> {
        self.require_level_up()?;
        self.shop.skip(&mut self.events)?;
        self.after_shop_closed();
        Ok(())
    }

    fn after_shop_closed(&mut self) {
        if self.leveling.resolve_pending(&mut self.events) {
            self.open_shop();
        } else {
            self.phase = GamePhase::Playing;
        }
    }
}
