//! Enemy spawner: weighted type selection and safe-distance placement
//!
//! Spawning is time-driven. The internal timer accumulates `dt` and a batch is
//! released every `interval` seconds regardless of frame rate.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::collision::Bounds;
use super::enemies::EnemySystem;
use crate::config::SpawnerConfig;
use crate::defs::{Definitions, EnemyDef};
use crate::polar_offset;

/// Static obstacle lookup consumed by spawn-position sampling
pub trait ObstacleQuery {
    fn is_blocked(&self, p: Vec2) -> bool;
}

/// Open arena
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl ObstacleQuery for NoObstacles {
    fn is_blocked(&self, _p: Vec2) -> bool {
        false
    }
}

/// Axis-aligned rectangular obstacles
#[derive(Debug, Clone, Default)]
pub struct ObstacleMap {
    pub rects: Vec<Bounds>,
}

impl ObstacleQuery for ObstacleMap {
    fn is_blocked(&self, p: Vec2) -> bool {
        self.rects.iter().any(|r| r.contains(p))
    }
}

/// Adapter for a predicate supplied by the host
pub struct ObstacleFn<F>(pub F);

impl<F: Fn(Vec2) -> bool> ObstacleQuery for ObstacleFn<F> {
    fn is_blocked(&self, p: Vec2) -> bool {
        (self.0)(p)
    }
}

/// Cumulative spawn weights in definition order
#[derive(Debug, Clone, Default)]
pub struct SpawnTable {
    /// (cumulative weight, index into `Definitions::enemies`)
    entries: Vec<(f32, usize)>,
    total: f32,
}

impl SpawnTable {
    pub fn build(enemies: &[EnemyDef]) -> Self {
        let mut entries = Vec::with_capacity(enemies.len());
        let mut total = 0.0;
        for (i, def) in enemies.iter().enumerate() {
            if def.spawn_rate <= 0.0 {
                continue;
            }
            total += def.spawn_rate;
            entries.push((total, i));
        }
        Self { entries, total }
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    /// First definition whose cumulative weight reaches `u * total`.
    /// `u` is a uniform draw in [0, 1).
    pub fn select(&self, u: f32) -> Option<usize> {
        let target = u * self.total;
        self.entries
            .iter()
            .find(|(cumulative, _)| *cumulative >= target)
            .or(self.entries.last())
            .map(|&(_, i)| i)
    }
}

#[derive(Debug, Clone)]
pub struct EnemySpawner {
    config: SpawnerConfig,
    table: SpawnTable,
    timer: f32,
    elapsed: f32,
    log_spawns: bool,
}

impl EnemySpawner {
    pub fn new(config: SpawnerConfig, defs: &Definitions, log_spawns: bool) -> Self {
        Self {
            config,
            table: SpawnTable::build(&defs.enemies),
            timer: 0.0,
            elapsed: 0.0,
            log_spawns,
        }
    }

    /// Rebuild the weight table after the definitions changed
    pub fn reload(&mut self, defs: &Definitions) {
        self.table = SpawnTable::build(&defs.enemies);
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Enemies released per interval at the current run time
    pub fn batch_size(&self) -> usize {
        if self.config.batch_growth_secs > 0.0 {
            1 + (self.elapsed / self.config.batch_growth_secs) as usize
        } else {
            1
        }
    }

    pub fn select_weighted_enemy<'d>(
        &self,
        defs: &'d Definitions,
        rng: &mut impl Rng,
    ) -> Option<&'d EnemyDef> {
        let u = rng.random::<f32>();
        self.table.select(u).and_then(|i| defs.enemies.get(i))
    }

    /// Sample the annulus around the player; falls back to a fixed distance
    /// along a random angle once the attempt budget is spent.
    pub fn find_spawn_position(
        &self,
        player_pos: Vec2,
        obstacles: &impl ObstacleQuery,
        rng: &mut impl Rng,
    ) -> Vec2 {
        let inner = self.config.safe_radius;
        let outer = inner + self.config.ring_width;
        for _ in 0..self.config.attempts {
            let theta = rng.random_range(0.0..TAU);
            let r = if outer > inner {
                rng.random_range(inner..outer)
            } else {
                inner
            };
            let candidate = polar_offset(player_pos, r, theta);
            if !obstacles.is_blocked(candidate) {
                return candidate;
            }
        }

        let theta = rng.random_range(0.0..TAU);
        let fallback = polar_offset(player_pos, inner + self.config.fallback_offset, theta);
        if self.log_spawns {
            log::debug!(
                "Spawn sampling exhausted {} attempts, using fallback ({:.0}, {:.0})",
                self.config.attempts,
                fallback.x,
                fallback.y
            );
        }
        fallback
    }

    /// Advance the timer and spawn any batches that came due. Returns the
    /// number of enemies created.
    pub fn update(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        defs: &Definitions,
        enemies: &mut EnemySystem,
        obstacles: &impl ObstacleQuery,
        rng: &mut impl Rng,
    ) -> usize {
        self.elapsed += dt;
        self.timer += dt;
        let mut spawned = 0;

        while self.timer >= self.config.interval {
            self.timer -= self.config.interval;
            for _ in 0..self.batch_size() {
                if enemies.active_count() >= self.config.max_active_enemies {
                    break;
                }
                let Some(def) = self.select_weighted_enemy(defs, rng) else {
                    return spawned;
                };
                let pos = self.find_spawn_position(player_pos, obstacles, rng);
                let id = enemies.spawn(def, pos, rng);
                spawned += 1;
                if self.log_spawns {
                    log::debug!("Spawned {} #{} at ({:.0}, {:.0})", def.id, id, pos.x, pos.y);
                }
            }
        }
        spawned
    }
}
