//! Ray-cast records shared by AABBs and shapes

use crate::foundation::math::Vec2;

/// A ray segment from `p1` towards `p2`, clipped at `max_fraction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastInput {
    /// Start point in world space
    pub p1: Vec2,
    /// Point reached at fraction 1.0
    pub p2: Vec2,
    /// Hits beyond this fraction of `p2 - p1` are ignored
    pub max_fraction: f32,
}

impl RayCastInput {
    /// Creates a new ray-cast input
    pub fn new(p1: Vec2, p2: Vec2, max_fraction: f32) -> Self {
        Self { p1, p2, max_fraction }
    }

    /// Get a point along the ray at fraction `t`
    pub fn point_at(&self, t: f32) -> Vec2 {
        self.p1 + (self.p2 - self.p1) * t
    }
}

/// Result of a ray intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastOutput {
    /// Surface normal at the hit point
    pub normal: Vec2,
    /// Fraction of `p2 - p1` at which the hit occurs
    pub fraction: f32,
}
