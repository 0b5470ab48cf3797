//! Weapon system: equipped weapons, cooldowns and per-behavior firing
//!
//! Each weapon cycles `Idle (cooldown > 0) -> Ready (cooldown == 0) -> Fired`.
//! Effective stats are cached on the instance and recomputed only when the
//! weapon's level or the passive buff revision changes.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pool::EntityPool;
use super::projectile::{Projectile, ProjectileOwner};
use super::shop::Upgrade;
use super::stats::{BuffSnapshot, WeaponStats, compose_weapon_stats};
use crate::config::WeaponConfig;
use crate::defs::{Behavior, Definitions, WeaponDef};
use crate::error::{CoreError, CoreResult, ItemClass};
use crate::{angle_of, direction_from_angle, polar_offset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponPhase {
    Idle,
    Ready,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponInstance {
    pub id: String,
    pub behavior: Behavior,
    pub level: u32,
    /// Seconds until Ready; never negative
    pub cooldown: f32,
    pub stats: WeaponStats,
    /// Buff revision the cached stats were computed against
    buff_revision: u64,
}

impl WeaponInstance {
    pub fn phase(&self) -> WeaponPhase {
        if self.cooldown <= 0.0 {
            WeaponPhase::Ready
        } else {
            WeaponPhase::Idle
        }
    }

    fn recompute(&mut self, def: &WeaponDef, buffs: &BuffSnapshot, min_fire_interval: f32) {
        self.stats = compose_weapon_stats(
            &def.base,
            &def.level_up,
            self.level,
            buffs,
            min_fire_interval,
        );
        self.buff_revision = buffs.revision;
    }
}

/// An orbiting unit belonging to a drone weapon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
    pub weapon_id: String,
    /// Current orbit angle (radians)
    pub angle: f32,
    pub pos: Vec2,
}

/// Slow bomb flying to its target point (aoe weapons)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bomb {
    pub weapon_id: String,
    pub pos: Vec2,
    pub target: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub crit: bool,
    pub blast_radius: f32,
}

/// Area damage produced this frame by a bomb arriving
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    pub weapon_id: String,
    pub pos: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub crit: bool,
}

/// Contact damage pulse from one drone
#[derive(Debug, Clone, PartialEq)]
pub struct DronePulse {
    pub weapon_id: String,
    pub pos: Vec2,
    pub radius: f32,
    pub damage: f32,
}

/// Everything weapons produced this frame besides pooled projectiles
#[derive(Debug, Clone, Default)]
pub struct WeaponOutput {
    pub shots_fired: u32,
    pub explosions: Vec<Explosion>,
    pub pulses: Vec<DronePulse>,
}

#[derive(Debug, Clone)]
pub struct WeaponSystem {
    /// Acquisition order; also the firing order within a frame
    weapons: Vec<WeaponInstance>,
    drones: Vec<Drone>,
    bombs: Vec<Bomb>,
    config: WeaponConfig,
    last_player_pos: Vec2,
}

impl WeaponSystem {
    pub fn new(config: WeaponConfig) -> Self {
        Self {
            weapons: Vec::new(),
            drones: Vec::new(),
            bombs: Vec::new(),
            config,
            last_player_pos: Vec2::ZERO,
        }
    }

    pub fn weapons(&self) -> &[WeaponInstance] {
        &self.weapons
    }

    pub fn weapon(&self, id: &str) -> Option<&WeaponInstance> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn drones(&self) -> &[Drone] {
        &self.drones
    }

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    /// Current level of `id`, 0 if unowned
    pub fn level_of(&self, id: &str) -> u32 {
        self.weapon(id).map(|w| w.level).unwrap_or(0)
    }

    pub fn slots_full(&self) -> bool {
        self.weapons.len() >= self.config.max_slots
    }

    /// Equip a new weapon at level 1. It is Ready immediately.
    pub fn acquire(&mut self, defs: &Definitions, id: &str, buffs: &BuffSnapshot) -> CoreResult<()> {
        let def = defs
            .weapon(id)
            .ok_or_else(|| CoreError::not_found(ItemClass::Weapon, id))?;
        if self.weapon(id).is_some() {
            return Err(CoreError::AlreadyOwned { id: id.to_string() });
        }
        if self.slots_full() {
            return Err(CoreError::SlotsFull {
                kind: ItemClass::Weapon,
                limit: self.config.max_slots,
            });
        }

        let mut instance = WeaponInstance {
            id: def.id.clone(),
            behavior: def.behavior,
            level: 1,
            cooldown: 0.0,
            stats: def.base,
            buff_revision: 0,
        };
        instance.recompute(def, buffs, self.config.min_fire_interval);
        let behavior = instance.behavior;
        let ring_size = instance.stats.volley_size();
        self.weapons.push(instance);

        if behavior == Behavior::Drone {
            self.rebuild_ring(id, ring_size);
        }
        log::info!("Weapon acquired: {} ({:?})", id, behavior);
        Ok(())
    }

    /// Raise an owned weapon one level. Returns the new level.
    pub fn level_up(&mut self, defs: &Definitions, id: &str, buffs: &BuffSnapshot) -> CoreResult<u32> {
        let def = defs
            .weapon(id)
            .ok_or_else(|| CoreError::not_found(ItemClass::Weapon, id))?;
        let min_interval = self.config.min_fire_interval;
        let instance = self
            .weapons
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(CoreError::InvalidState("cannot level an unowned weapon"))?;
        if instance.level >= def.max_level {
            return Err(CoreError::MaxLevel {
                id: id.to_string(),
                max_level: def.max_level,
            });
        }

        instance.level += 1;
        instance.recompute(def, buffs, min_interval);
        let level = instance.level;
        let behavior = instance.behavior;
        let ring_size = instance.stats.volley_size();

        if behavior == Behavior::Drone {
            self.rebuild_ring(id, ring_size);
        }
        log::info!("Weapon {} -> level {}", id, level);
        Ok(level)
    }

    pub fn add_or_upgrade(
        &mut self,
        defs: &Definitions,
        id: &str,
        buffs: &BuffSnapshot,
    ) -> CoreResult<Upgrade> {
        if self.level_of(id) == 0 {
            self.acquire(defs, id, buffs).map(|_| Upgrade::Gained)
        } else {
            self.level_up(defs, id, buffs).map(Upgrade::Leveled)
        }
    }

    /// Replace every drone of `weapon_id` with a fresh evenly spaced ring
    fn rebuild_ring(&mut self, weapon_id: &str, count: u32) {
        self.drones.retain(|d| d.weapon_id != weapon_id);
        for i in 0..count {
            self.drones.push(Drone {
                weapon_id: weapon_id.to_string(),
                angle: TAU * i as f32 / count as f32,
                pos: self.last_player_pos,
            });
        }
    }

    fn ring_size(&self, weapon_id: &str) -> u32 {
        self.drones.iter().filter(|d| d.weapon_id == weapon_id).count() as u32
    }

    /// Advance cooldowns, drones and bombs, and fire every Ready weapon
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        aim: Vec2,
        buffs: &BuffSnapshot,
        defs: &Definitions,
        projectiles: &mut EntityPool<Projectile>,
        rng: &mut impl Rng,
    ) -> WeaponOutput {
        self.last_player_pos = player_pos;
        let aim = aim.try_normalize().unwrap_or(Vec2::X);
        let mut output = WeaponOutput::default();

        // Buff changes invalidate cached stats
        let min_interval = self.config.min_fire_interval;
        let mut stale_rings = Vec::new();
        for weapon in &mut self.weapons {
            if weapon.buff_revision == buffs.revision {
                continue;
            }
            if let Some(def) = defs.weapon(&weapon.id) {
                weapon.recompute(def, buffs, min_interval);
                if weapon.behavior == Behavior::Drone {
                    stale_rings.push((weapon.id.clone(), weapon.stats.volley_size()));
                }
            }
        }
        for (id, size) in stale_rings {
            if self.ring_size(&id) != size {
                self.rebuild_ring(&id, size);
            }
        }

        self.orbit_drones(dt, player_pos);
        self.fly_bombs(dt, &mut output);

        for i in 0..self.weapons.len() {
            let weapon = &mut self.weapons[i];
            weapon.cooldown = (weapon.cooldown - dt).max(0.0);
            if weapon.phase() != WeaponPhase::Ready {
                continue;
            }
            weapon.cooldown = weapon.stats.fire_interval;

            let weapon = self.weapons[i].clone();
            match weapon.behavior {
                Behavior::Forward => {
                    self.fire_forward(&weapon, player_pos, aim, projectiles, rng);
                    output.shots_fired += 1;
                }
                Behavior::Spread => {
                    output.shots_fired += self.fire_spread(&weapon, player_pos, aim, projectiles, rng);
                }
                Behavior::Aoe => {
                    self.launch_bomb(&weapon, player_pos, aim, rng);
                    output.shots_fired += 1;
                }
                Behavior::Drone => {
                    self.pulse_drones(&weapon, &mut output);
                }
            }
        }

        output
    }

    fn roll_damage(stats: &WeaponStats, rng: &mut impl Rng) -> (f32, bool) {
        let crit = stats.crit_chance > 0.0 && rng.random::<f32>() < stats.crit_chance;
        if crit {
            (stats.damage * stats.crit_multiplier, true)
        } else {
            (stats.damage, false)
        }
    }

    fn spawn_projectile(
        &self,
        weapon: &WeaponInstance,
        origin: Vec2,
        dir: Vec2,
        projectiles: &mut EntityPool<Projectile>,
        rng: &mut impl Rng,
    ) {
        let (damage, crit) = Self::roll_damage(&weapon.stats, rng);
        projectiles.acquire(Projectile {
            pos: origin + dir * self.config.muzzle_offset,
            vel: dir * weapon.stats.projectile_speed,
            radius: self.config.projectile_radius,
            damage,
            crit,
            lifetime: self.config.projectile_max_lifetime,
            travel_remaining: weapon.stats.range,
            piercing: weapon.stats.pierce_count(),
            owner: ProjectileOwner::Weapon {
                weapon_id: weapon.id.clone(),
                level: weapon.level,
            },
            hits: Vec::new(),
            age: 0.0,
        });
    }

    fn fire_forward(
        &self,
        weapon: &WeaponInstance,
        player_pos: Vec2,
        aim: Vec2,
        projectiles: &mut EntityPool<Projectile>,
        rng: &mut impl Rng,
    ) {
        self.spawn_projectile(weapon, player_pos, aim, projectiles, rng);
    }

    /// Fan `volley_size` shots symmetrically about the aim. Returns shots fired.
    fn fire_spread(
        &self,
        weapon: &WeaponInstance,
        player_pos: Vec2,
        aim: Vec2,
        projectiles: &mut EntityPool<Projectile>,
        rng: &mut impl Rng,
    ) -> u32 {
        let count = weapon.stats.volley_size();
        if count == 1 {
            self.fire_forward(weapon, player_pos, aim, projectiles, rng);
            return 1;
        }
        for theta in spread_angles(angle_of(aim), weapon.stats.spread_angle.to_radians(), count) {
            self.spawn_projectile(weapon, player_pos, direction_from_angle(theta), projectiles, rng);
        }
        count
    }

    fn launch_bomb(&mut self, weapon: &WeaponInstance, player_pos: Vec2, aim: Vec2, rng: &mut impl Rng) {
        let (damage, crit) = Self::roll_damage(&weapon.stats, rng);
        self.bombs.push(Bomb {
            weapon_id: weapon.id.clone(),
            pos: player_pos + aim * self.config.muzzle_offset,
            target: player_pos + aim * weapon.stats.range,
            speed: weapon.stats.projectile_speed,
            damage,
            crit,
            blast_radius: weapon.stats.blast_radius,
        });
    }

    fn pulse_drones(&mut self, weapon: &WeaponInstance, output: &mut WeaponOutput) {
        let size = weapon.stats.volley_size();
        if self.ring_size(&weapon.id) != size {
            self.rebuild_ring(&weapon.id, size);
            self.orbit_drones(0.0, self.last_player_pos);
        }
        for drone in self.drones.iter().filter(|d| d.weapon_id == weapon.id) {
            output.pulses.push(DronePulse {
                weapon_id: weapon.id.clone(),
                pos: drone.pos,
                radius: self.config.drone_radius,
                damage: weapon.stats.damage,
            });
        }
    }

    fn orbit_drones(&mut self, dt: f32, player_pos: Vec2) {
        for drone in &mut self.drones {
            let Some(weapon) = self.weapons.iter().find(|w| w.id == drone.weapon_id) else {
                continue;
            };
            drone.angle = crate::normalize_angle(drone.angle + weapon.stats.orbit_speed * dt);
            drone.pos = polar_offset(player_pos, weapon.stats.orbit_radius, drone.angle);
        }
    }

    fn fly_bombs(&mut self, dt: f32, output: &mut WeaponOutput) {
        let mut i = 0;
        while i < self.bombs.len() {
            let bomb = &mut self.bombs[i];
            let to_target = bomb.target - bomb.pos;
            let step = bomb.speed * dt;
            if bomb.speed <= 0.0 || to_target.length() <= step {
                bomb.pos = bomb.target;
                let bomb = self.bombs.remove(i);
                output.explosions.push(Explosion {
                    weapon_id: bomb.weapon_id,
                    pos: bomb.pos,
                    radius: bomb.blast_radius,
                    damage: bomb.damage,
                    crit: bomb.crit,
                });
            } else {
                bomb.pos += to_target.normalize_or_zero() * step;
                i += 1;
            }
        }
    }
}

/// Shot angles fanned over `spread` radians, symmetric about `center`
pub fn spread_angles(center: f32, spread: f32, count: u32) -> Vec<f32> {
    if count <= 1 {
        return vec![center];
    }
    let start = center - spread / 2.0;
    let step = spread / (count - 1) as f32;
    (0..count).map(|i| start + step * i as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use crate::sim::stats::{Effect, StatKey};

    fn setup() -> (Definitions, WeaponSystem, EntityPool<Projectile>, Pcg32) {
        (
            Definitions::builtin().unwrap(),
            WeaponSystem::new(WeaponConfig::default()),
            EntityPool::new("projectiles", 64),
            Pcg32::seed_from_u64(7),
        )
    }

    #[test]
    fn test_acquire_unknown_is_not_found() {
        let (defs, mut weapons, _, _) = setup();
        let err = weapons.acquire(&defs, "railgun", &BuffSnapshot::default());
        assert!(matches!(err, Err(CoreError::NotFound { .. })));
        assert!(weapons.weapons().is_empty());
    }

    #[test]
    fn test_slot_limit_leaves_state_untouched() {
        let (defs, _, _, _) = setup();
        let mut weapons = WeaponSystem::new(WeaponConfig {
            max_slots: 1,
            ..Default::default()
        });
        let buffs = BuffSnapshot::default();
        weapons.acquire(&defs, "wand", &buffs).unwrap();
        let err = weapons.acquire(&defs, "halo", &buffs);
        assert!(matches!(err, Err(CoreError::SlotsFull { limit: 1, .. })));
        assert_eq!(weapons.weapons().len(), 1);
        assert!(weapons.drones().is_empty());
    }

    #[test]
    fn test_level_past_max_fails() {
        let (defs, mut weapons, _, _) = setup();
        let buffs = BuffSnapshot::default();
        weapons.acquire(&defs, "lance", &buffs).unwrap();
        for _ in 1..5 {
            weapons.level_up(&defs, "lance", &buffs).unwrap();
        }
        let stats = weapons.weapon("lance").unwrap().stats;
        assert!(matches!(
            weapons.level_up(&defs, "lance", &buffs),
            Err(CoreError::MaxLevel { max_level: 5, .. })
        ));
        assert_eq!(weapons.level_of("lance"), 5);
        assert_eq!(weapons.weapon("lance").unwrap().stats, stats);
    }

    #[test]
    fn test_forward_fires_then_idles() {
        let (defs, mut weapons, mut pool, mut rng) = setup();
        let buffs = BuffSnapshot::default();
        weapons.acquire(&defs, "wand", &buffs).unwrap();

        let out = weapons.update(0.016, Vec2::ZERO, Vec2::X, &buffs, &defs, &mut pool, &mut rng);
        assert_eq!(out.shots_fired, 1);
        assert_eq!(pool.active_count(), 1);
        let wand = weapons.weapon("wand").unwrap();
        assert_eq!(wand.phase(), WeaponPhase::Idle);
        assert!((wand.cooldown - 0.8).abs() < 1e-6);

        let out = weapons.update(0.016, Vec2::ZERO, Vec2::X, &buffs, &defs, &mut pool, &mut rng);
        assert_eq!(out.shots_fired, 0);

        // Projectile spawns at the muzzle offset along the aim
        let handle = pool.active_handles()[0];
        let shot = pool.get(handle).unwrap();
        assert!((shot.pos - Vec2::new(20.0, 0.0)).length() < 1e-4);
        assert!(shot.vel.x > 0.0 && shot.vel.y.abs() < 1e-4);
    }

    #[test]
    fn test_cooldown_never_negative() {
        let (defs, mut weapons, mut pool, mut rng) = setup();
        let buffs = BuffSnapshot::default();
        weapons.acquire(&defs, "mortar", &buffs).unwrap();
        weapons.update(10.0, Vec2::ZERO, Vec2::X, &buffs, &defs, &mut pool, &mut rng);
        weapons.update(10.0, Vec2::ZERO, Vec2::X, &buffs, &defs, &mut pool, &mut rng);
        assert!(weapons.weapons().iter().all(|w| w.cooldown >= 0.0));
    }

    #[test]
    fn test_spread_is_symmetric() {
        let angles = spread_angles(0.0, 40f32.to_radians(), 3);
        assert_eq!(angles.len(), 3);
        assert!((angles[0] + angles[2]).abs() < 1e-6);
        assert!(angles[1].abs() < 1e-6);
        assert_eq!(spread_angles(1.0, 1.0, 1), vec![1.0]);
    }

    #[test]
    fn test_spread_fires_volley() {
        let (defs, mut weapons, mut pool, mut rng) = setup();
        let buffs = BuffSnapshot::default();
        weapons.acquire(&defs, "scatter", &buffs).unwrap();
        let out = weapons.update(0.016, Vec2::ZERO, Vec2::Y, &buffs, &defs, &mut pool, &mut rng);
        assert_eq!(out.shots_fired, 3);
        assert_eq!(pool.active_count(), 3);
    }

    #[test]
    fn test_bomb_flies_and_explodes() {
        let (defs, mut weapons, mut pool, mut rng) = setup();
        let buffs = BuffSnapshot::default();
        weapons.acquire(&defs, "mortar", &buffs).unwrap();
        weapons.update(0.016, Vec2::ZERO, Vec2::X, &buffs, &defs, &mut pool, &mut rng);
        assert_eq!(weapons.bombs().len(), 1);
        assert_eq!(pool.active_count(), 0);
        assert!((weapons.bombs()[0].target - Vec2::new(260.0, 0.0)).length() < 1e-3);

        // 240 units at 180/s
        let mut explosions = Vec::new();
        for _ in 0..100 {
            let out = weapons.update(0.016, Vec2::ZERO, Vec2::X, &buffs, &defs, &mut pool, &mut rng);
            explosions.extend(out.explosions);
            if !explosions.is_empty() {
                break;
            }
        }
        assert_eq!(explosions.len(), 1);
        assert!((explosions[0].pos - Vec2::new(260.0, 0.0)).length() < 1e-3);
        assert!((explosions[0].radius - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_drone_ring_rebuilt_on_level_up() {
        let (defs, mut weapons, mut pool, mut rng) = setup();
        let buffs = BuffSnapshot::default();
        weapons.acquire(&defs, "halo", &buffs).unwrap();
        assert_eq!(weapons.drones().len(), 2);

        weapons.level_up(&defs, "halo", &buffs).unwrap();
        assert_eq!(weapons.drones().len(), 3);

        let out = weapons.update(0.016, Vec2::new(50.0, 50.0), Vec2::X, &buffs, &defs, &mut pool, &mut rng);
        assert_eq!(out.pulses.len(), 3);
        for drone in weapons.drones() {
            let r = drone.pos.distance(Vec2::new(50.0, 50.0));
            assert!((r - 90.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_buff_change_recomputes_and_resizes_ring() {
        let (defs, mut weapons, mut pool, mut rng) = setup();
        let buffs = BuffSnapshot::default();
        weapons.acquire(&defs, "halo", &buffs).unwrap();
        weapons.acquire(&defs, "wand", &buffs).unwrap();

        let mut buffed = BuffSnapshot::with_revision(1);
        buffed.add(StatKey::ProjectileCount, Effect::Flat(1.0), 1.0);
        buffed.add(StatKey::Damage, Effect::Percent(50.0), 1.0);
        weapons.update(0.016, Vec2::ZERO, Vec2::X, &buffed, &defs, &mut pool, &mut rng);

        assert_eq!(weapons.drones().len(), 3);
        assert!((weapons.weapon("wand").unwrap().stats.damage - 15.0).abs() < 1e-4);
    }
}
