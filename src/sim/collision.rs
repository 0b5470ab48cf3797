//! Simple distance and AABB collision checks
//!
//! Everything in the arena is a circle (player, enemies, projectiles, gems,
//! drones) except static obstacles, which are axis-aligned rectangles.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, inclusive on all edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square centered on the origin
    pub fn square(half_extent: f32) -> Self {
        Self {
            min: Vec2::splat(-half_extent),
            max: Vec2::splat(half_extent),
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn is_valid(&self) -> bool {
        self.min.x < self.max.x && self.min.y < self.max.y
    }
}

/// Check if two circles touch or overlap
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) <= reach * reach
}

/// Direction from `from` toward `to`, or zero when the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}
