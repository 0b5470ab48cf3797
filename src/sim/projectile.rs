//! Pooled projectiles fired by weapons and ranged enemies

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Bounds;
use super::pool::Pooled;

/// Who fired a projectile (hit attribution and debugging)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectileOwner {
    Weapon { weapon_id: String, level: u32 },
    Enemy { enemy_id: u32 },
}

/// Why a projectile stopped existing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Lifetime,
    Range,
    OutOfBounds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub crit: bool,
    /// Seconds left before expiry
    pub lifetime: f32,
    /// Distance left before expiry
    pub travel_remaining: f32,
    /// Additional enemies this projectile may pass through
    pub piercing: u32,
    pub owner: ProjectileOwner,
    /// Enemies already damaged by this projectile
    #[serde(default)]
    pub hits: Vec<u32>,
    #[serde(default)]
    pub age: f32,
}

impl Projectile {
    /// Advance one step. Returns the expiry reason if the projectile is done.
    pub fn advance(&mut self, dt: f32, bounds: &Bounds) -> Option<Expiry> {
        let step = self.vel * dt;
        self.pos += step;
        self.age += dt;
        self.lifetime -= dt;
        self.travel_remaining -= step.length();

        if self.lifetime <= 0.0 {
            Some(Expiry::Lifetime)
        } else if self.travel_remaining <= 0.0 {
            Some(Expiry::Range)
        } else if !bounds.contains(self.pos) {
            Some(Expiry::OutOfBounds)
        } else {
            None
        }
    }

    pub fn has_hit(&self, enemy_id: u32) -> bool {
        self.hits.contains(&enemy_id)
    }

    /// Register a hit. Returns true if the projectile survives (piercing).
    pub fn consume_hit(&mut self, enemy_id: u32) -> bool {
        self.hits.push(enemy_id);
        if self.piercing > 0 {
            self.piercing -= 1;
            true
        } else {
            false
        }
    }
}

impl Pooled for Projectile {
    fn age(&self) -> f32 {
        self.age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(vel: Vec2, lifetime: f32, range: f32) -> Projectile {
        Projectile {
            pos: Vec2::ZERO,
            vel,
            radius: 4.0,
            damage: 5.0,
            crit: false,
            lifetime,
            travel_remaining: range,
            piercing: 1,
            owner: ProjectileOwner::Enemy { enemy_id: 1 },
            hits: Vec::new(),
            age: 0.0,
        }
    }

    #[test]
    fn test_expires_on_range() {
        let bounds = Bounds::square(1000.0);
        let mut p = shot(Vec2::new(100.0, 0.0), 10.0, 150.0);
        assert_eq!(p.advance(1.0, &bounds), None);
        assert_eq!(p.advance(1.0, &bounds), Some(Expiry::Range));
    }

    #[test]
    fn test_expires_on_lifetime_and_bounds() {
        let bounds = Bounds::square(50.0);
        let mut p = shot(Vec2::new(10.0, 0.0), 0.5, 1000.0);
        assert_eq!(p.advance(1.0, &bounds), Some(Expiry::Lifetime));

        let mut p = shot(Vec2::new(100.0, 0.0), 10.0, 1000.0);
        assert_eq!(p.advance(1.0, &bounds), Some(Expiry::OutOfBounds));
    }

    #[test]
    fn test_piercing_consumes_charges() {
        let mut p = shot(Vec2::X, 1.0, 1.0);
        assert!(p.consume_hit(7));
        assert_eq!(p.piercing, 0);
        assert!(p.has_hit(7));
        assert!(!p.consume_hit(8));
    }
}
