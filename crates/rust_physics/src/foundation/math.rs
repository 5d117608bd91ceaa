//! Math utilities and types
//!
//! Provides the 2D math types used by shapes, fixtures and bodies.

pub use nalgebra::{Point2, UnitComplex, Vector2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 2D rotation type
pub type Rot2 = UnitComplex<f32>;

/// Rigid transform representing position and rotation of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2 {
    /// Position of the body origin in world space
    pub position: Vec2,

    /// Rotation about the body origin
    pub rotation: Rot2,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: Rot2::identity(),
        }
    }
}

impl Transform2 {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with position and rotation angle in radians
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            position,
            rotation: Rot2::new(angle),
        }
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Rotation angle in radians
    pub fn angle(&self) -> f32 {
        self.rotation.angle()
    }

    /// Map a body-local point into world space
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.rotation * local + self.position
    }

    /// Rotate a body-local vector into world space
    pub fn transform_vector(&self, local: Vec2) -> Vec2 {
        self.rotation * local
    }

    /// Map a world-space point into body-local space
    pub fn inverse_transform_point(&self, world: Vec2) -> Vec2 {
        self.rotation.inverse() * (world - self.position)
    }

    /// Rotate a world-space vector into body-local space
    pub fn inverse_transform_vector(&self, world: Vec2) -> Vec2 {
        self.rotation.inverse() * world
    }
}

/// 2D cross product of two vectors (z component of the 3D cross)
pub fn cross(a: &Vec2, b: &Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_point_round_trip() {
        let xf = Transform2::new(Vec2::new(3.0, -2.0), std::f32::consts::FRAC_PI_2);
        let local = Vec2::new(1.0, 0.0);

        let world = xf.transform_point(local);
        assert_relative_eq!(world.x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(world.y, -1.0, epsilon = 1e-5);

        let back = xf.inverse_transform_point(world);
        assert_relative_eq!(back.x, local.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, local.y, epsilon = 1e-5);
    }

    #[test]
    fn test_cross() {
        assert_eq!(cross(&Vec2::new(1.0, 0.0), &Vec2::new(0.0, 1.0)), 1.0);
        assert_eq!(cross(&Vec2::new(0.0, 1.0), &Vec2::new(1.0, 0.0)), -1.0);
    }
}
