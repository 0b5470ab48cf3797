//! Enemy system: steering, contact and ranged attacks, death lifecycle
//!
//! Enemies live in a `Vec` in spawn order, so iteration is stable by id.
//! Lifecycle is `Active -> Dying -> Removed`; removed enemies are dropped at
//! the end of the update that retired them.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{circles_overlap, direction_to};
use super::player::PlayerPort;
use super::pool::EntityPool;
use super::projectile::{Projectile, ProjectileOwner};
use crate::config::EnemyConfig;
use crate::defs::{EnemyDef, RangedAttack};
use crate::events::{DamageSource, EventLog, GameEvent};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyState {
    Active,
    /// Fading out; `fade` counts seconds since death
    Dying { fade: f32 },
    Removed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub def_id: String,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Unit vector of the last movement direction
    pub facing: Vec2,
    pub size: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub xp_multiplier: f32,
    pub ranged: Option<RangedAttack>,
    /// Seconds until the next ranged shot is allowed
    pub ranged_cooldown: f32,
    pub state: EnemyState,
}

impl Enemy {
    pub fn is_active(&self) -> bool {
        self.state == EnemyState::Active
    }
}

/// Result of [`EnemySystem::apply_damage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Unknown id or already dying
    Ignored,
    Damaged,
    Killed,
}

#[derive(Debug, Clone)]
pub struct EnemySystem {
    enemies: Vec<Enemy>,
    next_id: u32,
    config: EnemyConfig,
    log_damage: bool,
}

impl EnemySystem {
    pub fn new(config: EnemyConfig, log_damage: bool) -> Self {
        Self {
            enemies: Vec::new(),
            next_id: 1,
            config,
            log_damage,
        }
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn get(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    /// Enemies not yet dying
    pub fn active_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_active()).count()
    }

    /// Create an enemy from its definition, jittering HP and speed
    pub fn spawn(&mut self, def: &EnemyDef, pos: Vec2, rng: &mut impl Rng) -> u32 {
        let (hp_scale, speed_scale) = if def.jitter > 0.0 {
            (
                1.0 + rng.random_range(-def.jitter..=def.jitter),
                1.0 + rng.random_range(-def.jitter..=def.jitter),
            )
        } else {
            (1.0, 1.0)
        };
        let hp = def.hp * hp_scale;
        let speed = def.speed * speed_scale;

        let id = self.next_id;
        self.next_id += 1;
        self.enemies.push(Enemy {
            id,
            def_id: def.id.clone(),
            pos,
            vel: Vec2::ZERO,
            facing: Vec2::X,
            size: def.size,
            hp,
            max_hp: hp,
            damage: def.damage,
            speed,
            xp_multiplier: def.xp_multiplier,
            ranged: def.ranged,
            ranged_cooldown: def.ranged.map(|r| r.cooldown).unwrap_or(0.0),
            state: EnemyState::Active,
        });
        id
    }

    /// Steer, attack and fade every enemy for one frame
    pub fn update(
        &mut self,
        dt: f32,
        player: &mut impl PlayerPort,
        player_hit_radius: f32,
        enemy_projectiles: &mut EntityPool<Projectile>,
        events: &mut EventLog,
    ) {
        let mut contact_kills = Vec::new();

        for enemy in &mut self.enemies {
            match enemy.state {
                EnemyState::Removed => continue,
                EnemyState::Dying { fade } => {
                    let fade = fade + dt;
                    enemy.state = if fade >= self.config.death_fade {
                        EnemyState::Removed
                    } else {
                        EnemyState::Dying { fade }
                    };
                    continue;
                }
                EnemyState::Active => {}
            }

            let player_pos = player.position();
            let dir = direction_to(enemy.pos, player_pos);
            enemy.vel = dir * enemy.speed;
            enemy.pos += enemy.vel * dt;
            if dir != Vec2::ZERO {
                enemy.facing = dir;
            }

            if circles_overlap(enemy.pos, enemy.size, player_pos, player_hit_radius)
                && !player.is_invulnerable()
            {
                let taken = player.take_damage(enemy.damage);
                events.push(GameEvent::PlayerDamaged {
                    amount: taken,
                    remaining_hp: player.hp(),
                });
                contact_kills.push(enemy.id);
                continue;
            }

            if let Some(ranged) = enemy.ranged {
                enemy.ranged_cooldown = (enemy.ranged_cooldown - dt).max(0.0);
                let in_range = enemy.pos.distance(player_pos) <= ranged.range;
                if in_range && enemy.ranged_cooldown <= 0.0 {
                    let travel = ranged.range * 1.5;
                    enemy_projectiles.acquire(Projectile {
                        pos: enemy.pos,
                        vel: direction_to(enemy.pos, player_pos) * ranged.projectile_speed,
                        radius: self.config.projectile_radius,
                        damage: ranged.damage,
                        crit: false,
                        lifetime: travel / ranged.projectile_speed,
                        travel_remaining: travel,
                        piercing: 0,
                        owner: ProjectileOwner::Enemy { enemy_id: enemy.id },
                        hits: Vec::new(),
                        age: 0.0,
                    });
                    enemy.ranged_cooldown = ranged.cooldown;
                }
            }
        }

        // Contact is lethal to the enemy regardless of remaining HP
        for id in contact_kills {
            let hp = self.get(id).map(|e| e.hp).unwrap_or(0.0);
            self.apply_damage(id, hp, false, DamageSource::Contact, events);
        }

        self.enemies.retain(|e| e.state != EnemyState::Removed);
    }

    /// Subtract HP and emit events. Dying enemies ignore further damage.
    pub fn apply_damage(
        &mut self,
        id: u32,
        amount: f32,
        crit: bool,
        source: DamageSource,
        events: &mut EventLog,
    ) -> DamageOutcome {
        let Some(enemy) = self.enemies.iter_mut().find(|e| e.id == id) else {
            return DamageOutcome::Ignored;
        };
        if !enemy.is_active() {
            return DamageOutcome::Ignored;
        }

        enemy.hp = (enemy.hp - amount).max(0.0);
        if self.log_damage {
            log::debug!(
                "Enemy {} ({}) took {:.1} from {:?}, hp {:.1}/{:.1}",
                enemy.id,
                enemy.def_id,
                amount,
                source,
                enemy.hp,
                enemy.max_hp
            );
        }
        events.push(GameEvent::DamageApplied {
            enemy_id: id,
            amount,
            remaining_hp: enemy.hp,
            crit,
            source,
        });

        if enemy.hp > 0.0 {
            return DamageOutcome::Damaged;
        }

        enemy.state = EnemyState::Dying { fade: 0.0 };
        enemy.vel = Vec2::ZERO;
        events.push(GameEvent::EnemyKilled {
            enemy_id: id,
            def_id: enemy.def_id.clone(),
            pos: enemy.pos,
            xp_multiplier: enemy.xp_multiplier,
        });
        DamageOutcome::Killed
    }

    /// Ids of active enemies overlapping a circle, in spawn order
    pub fn active_in_circle(&self, center: Vec2, radius: f32) -> Vec<u32> {
        self.enemies
            .iter()
            .filter(|e| e.is_active() && circles_overlap(e.pos, e.size, center, radius))
            .map(|e| e.id)
            .collect()
    }
}
