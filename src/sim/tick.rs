//! Fixed-order per-frame update
//!
//! spawner -> enemies -> weapons -> projectile/bomb/drone collision ->
//! gems from this frame's kills -> gem pickup -> experience -> shop.
//! Nothing advances while the shop is open or after game over.

use glam::Vec2;

use super::collision::circles_overlap;
use super::gem::ExperienceGem;
use super::player::PlayerPort;
use super::projectile::ProjectileOwner;
use super::state::{GamePhase, GameState};
use super::weapons::{DronePulse, Explosion};
use crate::events::{DamageSource, GameEvent};

/// Per-frame input from the player collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// New player position (movement is owned outside the core)
    pub player_pos: Option<Vec2>,
    /// New aim direction; zero keeps the previous aim
    pub aim: Option<Vec2>,
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase != GamePhase::Playing {
        return;
    }

    if let Some(pos) = input.player_pos {
        state.player.pos = pos;
    }
    if let Some(aim) = input.aim {
        state.player.set_aim(aim);
    }
    state.time_ticks += 1;
    state.elapsed += dt;
    state.player.tick_timers(dt);

    let frame_start = state.events.len();
    let player_pos = state.player.position();

    state.spawner.update(
        dt,
        player_pos,
        &state.defs,
        &mut state.enemies,
        &state.obstacles,
        &mut state.rng,
    );

    state.enemies.update(
        dt,
        &mut state.player,
        state.config.player.hit_radius,
        &mut state.enemy_projectiles,
        &mut state.events,
    );

    let output = state.weapons.update(
        dt,
        player_pos,
        state.player.aim(),
        state.passives.buffs(),
        &state.defs,
        &mut state.projectiles,
        &mut state.rng,
    );

    update_player_projectiles(state, dt);
    update_enemy_projectiles(state, dt);
    apply_explosions(state, &output.explosions);
    apply_drone_pulses(state, &output.pulses);

    if state.player.is_dead() {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::PlayerDied);
        log::info!(
            "Player died at {:.1}s (level {}, {} kills)",
            state.elapsed,
            state.leveling.level(),
            state.kills
        );
        return;
    }

    drop_gems(state, frame_start);
    collect_gems(state, dt);

    if state.leveling.is_pending() && !state.shop.is_open() {
        state.open_shop();
    }
}

fn update_player_projectiles(state: &mut GameState, dt: f32) {
    for handle in state.projectiles.active_handles() {
        let Some(projectile) = state.projectiles.get_mut(handle) else {
            continue;
        };
        if projectile.advance(dt, &state.config.world).is_some() {
            state.projectiles.release(handle);
            continue;
        }

        let targets = state
            .enemies
            .active_in_circle(projectile.pos, projectile.radius);
        for enemy_id in targets {
            let Some(projectile) = state.projectiles.get_mut(handle) else {
                break;
            };
            if projectile.has_hit(enemy_id) {
                continue;
            }
            let (damage, crit) = (projectile.damage, projectile.crit);
            let weapon_id = match &projectile.owner {
                ProjectileOwner::Weapon { weapon_id, .. } => weapon_id.clone(),
                ProjectileOwner::Enemy { .. } => String::new(),
            };
            let survives = projectile.consume_hit(enemy_id);

            state.enemies.apply_damage(
                enemy_id,
                damage,
                crit,
                DamageSource::Projectile { weapon_id },
                &mut state.events,
            );
            if !survives {
                state.projectiles.release(handle);
                break;
            }
        }
    }
}

fn update_enemy_projectiles(state: &mut GameState, dt: f32) {
    let player_pos = state.player.position();
    let hit_radius = state.config.player.hit_radius;

    for handle in state.enemy_projectiles.active_handles() {
        let Some(projectile) = state.enemy_projectiles.get_mut(handle) else {
            continue;
        };
        if projectile.advance(dt, &state.config.world).is_some() {
            state.enemy_projectiles.release(handle);
            continue;
        }
        if !circles_overlap(projectile.pos, projectile.radius, player_pos, hit_radius) {
            continue;
        }
        let damage = projectile.damage;
        state.enemy_projectiles.release(handle);

        let taken = state.player.take_damage(damage);
        if taken > 0.0 {
            state.events.push(GameEvent::PlayerDamaged {
                amount: taken,
                remaining_hp: state.player.hp,
            });
        }
    }
}

fn apply_explosions(state: &mut GameState, explosions: &[Explosion]) {
    for explosion in explosions {
        for enemy_id in state.enemies.active_in_circle(explosion.pos, explosion.radius) {
            state.enemies.apply_damage(
                enemy_id,
                explosion.damage,
                explosion.crit,
                DamageSource::Explosion {
                    weapon_id: explosion.weapon_id.clone(),
                },
                &mut state.events,
            );
        }
    }
}

fn apply_drone_pulses(state: &mut GameState, pulses: &[DronePulse]) {
    for pulse in pulses {
        for enemy_id in state.enemies.active_in_circle(pulse.pos, pulse.radius) {
            state.enemies.apply_damage(
                enemy_id,
                pulse.damage,
                false,
                DamageSource::Drone {
                    weapon_id: pulse.weapon_id.clone(),
                },
                &mut state.events,
            );
        }
    }
}

/// One gem and one currency award per kill recorded this frame
fn drop_gems(state: &mut GameState, frame_start: usize) {
    let kills: Vec<(Vec2, f32)> = state
        .events
        .iter()
        .skip(frame_start)
        .filter_map(|e| match e {
            GameEvent::EnemyKilled {
                pos, xp_multiplier, ..
            } => Some((*pos, *xp_multiplier)),
            _ => None,
        })
        .collect();

    for (pos, xp_multiplier) in kills {
        state.kills += 1;
        state.player.earn(state.config.enemies.currency_per_kill);
        let value = state.config.gems.base_value * xp_multiplier;
        state.gems.acquire(ExperienceGem::new(pos, value));
    }
}

fn collect_gems(state: &mut GameState, dt: f32) {
    let player_pos = state.player.position();
    let radius = state.attraction_radius();
    let gem_config = &state.config.gems;

    let mut picked = Vec::new();
    state.gems.retain_active(|gem| {
        if gem.update(dt, player_pos, radius, gem_config) {
            picked.push(gem.value);
            false
        } else {
            true
        }
    });

    for value in picked {
        state.leveling.add_experience(value, &mut state.events);
    }
}
