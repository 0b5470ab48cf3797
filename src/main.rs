//! Horde Arena headless driver
//!
//! Runs a scripted session against the simulation core and logs a summary.
//!
//! Usage: `horde-arena [config.json] [definitions.json]`

use std::process::ExitCode;

use glam::Vec2;
use horde_arena::consts::*;
use horde_arena::sim::{GamePhase, GameState, TickInput, tick};
use horde_arena::{CoreError, CoreResult, Definitions, GameEvent, SimConfig};

/// Simulated run length in seconds
const RUN_SECONDS: f32 = 180.0;
/// Radius of the scripted player's circle
const CIRCLE_RADIUS: f32 = 220.0;
/// Angular speed of the scripted player (rad/s)
const CIRCLE_SPEED: f32 = 0.6;

fn read_file(path: &str) -> CoreResult<String> {
    std::fs::read_to_string(path).map_err(|e| CoreError::Config(format!("{}: {}", path, e)))
}

fn load() -> CoreResult<(SimConfig, Definitions)> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::from_json_str(&read_file(&path)?)?,
        None => SimConfig::default(),
    };
    let defs = match args.next() {
        Some(path) => Definitions::from_json_str(&read_file(&path)?)?,
        None => Definitions::builtin()?,
    };
    Ok((config, defs))
}

#[derive(Debug, Default)]
struct Summary {
    damage_dealt: f32,
    damage_taken: f32,
    crits: u32,
    shops: u32,
    dropped_xp: f32,
}

impl Summary {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::DamageApplied { amount, crit, .. } => {
                self.damage_dealt += amount;
                if *crit {
                    self.crits += 1;
                }
            }
            GameEvent::PlayerDamaged { amount, .. } => self.damage_taken += amount,
            GameEvent::ShopOpened { .. } => self.shops += 1,
            GameEvent::ExperienceDropped { amount } => self.dropped_xp += amount,
            GameEvent::ItemGained { id, kind } => log::info!("Picked new {:?}: {}", kind, id),
            GameEvent::ItemLeveled { id, level, .. } => log::info!("Upgraded {} to {}", id, level),
            _ => {}
        }
    }
}

fn run(seed: u64) -> CoreResult<()> {
    let (config, defs) = load()?;
    let mut state = GameState::new(seed, config, defs)?;
    let mut summary = Summary::default();

    let total_ticks = (RUN_SECONDS / SIM_DT) as u64;
    for _ in 0..total_ticks {
        if state.phase == GamePhase::LevelUp {
            // Auto-pick the first card; an empty offer is skipped
            if state.select_card(0).is_err() {
                state.skip_shop()?;
            }
        }
        if state.phase == GamePhase::GameOver {
            break;
        }

        let theta = state.elapsed * CIRCLE_SPEED;
        let pos = Vec2::new(theta.cos(), theta.sin()) * CIRCLE_RADIUS;
        let input = TickInput {
            player_pos: Some(pos),
            // Aim along the direction of travel
            aim: Some(Vec2::new(-theta.sin(), theta.cos())),
        };
        tick(&mut state, &input, SIM_DT);

        for event in state.events.drain() {
            summary.record(&event);
        }
    }

    log::info!(
        "Run finished after {:.1}s: phase {:?}, level {}, {} kills, hp {:.0}/{:.0}",
        state.elapsed,
        state.phase,
        state.leveling.level(),
        state.kills,
        state.player.hp,
        state.player.max_hp
    );
    log::info!(
        "Damage dealt {:.0} ({} crits), taken {:.0}, {} shops, {:.0} xp dropped",
        summary.damage_dealt,
        summary.crits,
        summary.damage_taken,
        summary.shops,
        summary.dropped_xp
    );
    for weapon in state.weapons.weapons() {
        log::info!("  weapon {} lv{}", weapon.id, weapon.level);
    }
    for passive in state.passives.instances() {
        log::info!("  passive {} lv{}", passive.id, passive.level);
    }
    log::info!(
        "Pools: {} projectiles, {} enemy projectiles, {} gems active",
        state.projectiles.active_count(),
        state.enemy_projectiles.active_count(),
        state.gems.active_count()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    log::info!("Horde Arena (headless) starting with seed {}", seed);

    match run(seed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
