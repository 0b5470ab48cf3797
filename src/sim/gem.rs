//! Experience gems dropped by dying enemies

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::Pooled;
use crate::config::GemConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceGem {
    pub pos: Vec2,
    pub vel: Vec2,
    pub value: f32,
    /// Set once the player comes within the attraction radius; never cleared
    pub attracted: bool,
    pub age: f32,
}

impl ExperienceGem {
    pub fn new(pos: Vec2, value: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            value,
            attracted: false,
            age: 0.0,
        }
    }

    /// Advance one step toward the player. Returns true when picked up.
    pub fn update(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        attraction_radius: f32,
        config: &GemConfig,
    ) -> bool {
        self.age += dt;

        let to_player = player_pos - self.pos;
        let dist = to_player.length();
        if dist <= config.pickup_radius {
            return true;
        }

        if !self.attracted && dist <= attraction_radius {
            self.attracted = true;
        }

        if self.attracted {
            let speed = magnet_speed(dist, attraction_radius, config);
            // Never overshoot the player in a single step
            let step = (speed * dt).min(dist);
            self.vel = to_player / dist * speed;
            self.pos += to_player / dist * step;
            if self.pos.distance(player_pos) <= config.pickup_radius {
                return true;
            }
        } else {
            self.vel = Vec2::ZERO;
        }
        false
    }
}

/// Quadratic ease: `min_speed` at the radius edge, `max_speed` at the player
pub fn magnet_speed(dist: f32, attraction_radius: f32, config: &GemConfig) -> f32 {
    let t = if attraction_radius > 0.0 {
        (1.0 - dist / attraction_radius).clamp(0.0, 1.0)
    } else {
        0.0
    };
    config.min_magnet_speed + (config.max_magnet_speed - config.min_magnet_speed) * t * t
}

impl Pooled for ExperienceGem {
    fn age(&self) -> f32 {
        self.age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GemConfig {
        GemConfig {
            base_value: 10.0,
            attraction_radius: 100.0,
            min_magnet_speed: 100.0,
            max_magnet_speed: 500.0,
            pickup_radius: 10.0,
        }
    }

    #[test]
    fn test_idle_outside_radius() {
        let mut gem = ExperienceGem::new(Vec2::new(200.0, 0.0), 5.0);
        assert!(!gem.update(0.1, Vec2::ZERO, 100.0, &config()));
        assert!(!gem.attracted);
        assert_eq!(gem.pos, Vec2::new(200.0, 0.0));
    }

    #[test]
    fn test_attracted_moves_toward_player() {
        let mut gem = ExperienceGem::new(Vec2::new(90.0, 0.0), 5.0);
        assert!(!gem.update(0.01, Vec2::ZERO, 100.0, &config()));
        assert!(gem.attracted);
        assert!(gem.pos.x < 90.0);
    }

    #[test]
    fn test_attraction_is_sticky() {
        let mut gem = ExperienceGem::new(Vec2::new(90.0, 0.0), 5.0);
        gem.update(0.01, Vec2::ZERO, 100.0, &config());
        // Player runs away beyond the radius; the gem keeps chasing
        let before = gem.pos;
        gem.update(0.01, Vec2::new(-500.0, 0.0), 100.0, &config());
        assert!(gem.attracted);
        assert!(gem.pos.x < before.x);
    }

    #[test]
    fn test_pickup_within_radius() {
        let mut gem = ExperienceGem::new(Vec2::new(5.0, 0.0), 5.0);
        assert!(gem.update(0.01, Vec2::ZERO, 100.0, &config()));
    }

    #[test]
    fn test_magnet_speed_easing() {
        let c = config();
        assert!((magnet_speed(100.0, 100.0, &c) - 100.0).abs() < 1e-4);
        assert!((magnet_speed(0.0, 100.0, &c) - 500.0).abs() < 1e-4);
        // Halfway: 100 + 400 * 0.25
        assert!((magnet_speed(50.0, 100.0, &c) - 200.0).abs() < 1e-4);
    }
}
