//! Axis-aligned bounding boxes
//!
//! All arcade entities are centered boxes. Point tests are inclusive on the
//! edges (a projectile grazing an enemy's edge is a hit); box overlap is
//! strict (touching edges do not collide).

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    /// Box of `size` centered on `center`
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_extents: size * 0.5,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Inclusive point containment
    pub fn contains_point(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Strict overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        delta.x < reach.x && delta.y < reach.y
    }
}
