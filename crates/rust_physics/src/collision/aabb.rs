//! Axis-Aligned Bounding Box for spatial queries
//!
//! Both [`AABB::overlaps`] and [`AABB::contains`] are inclusive on every
//! edge: boxes that share an edge overlap, and a box equal to its container
//! is contained by it.

use crate::collision::ray::{RayCastInput, RayCastOutput};
use crate::foundation::math::Vec2;

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec2,
    /// Maximum corner of the bounding box
    pub max: Vec2,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create an AABB from scalar corner coordinates
    pub fn from_coords(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self::new(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Perimeter length, used as a cheap size metric
    pub fn perimeter(&self) -> f32 {
        2.0 * ((self.max.x - self.min.x) + (self.max.y - self.min.y))
    }

    /// Whether min is component-wise below max and no coordinate is NaN
    pub fn is_valid(&self) -> bool {
        let d = self.max - self.min;
        d.x >= 0.0 && d.y >= 0.0 && self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
    }

    /// Smallest AABB enclosing both boxes
    pub fn combine(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Grow the box by `amount` on every side
    pub fn expanded(&self, amount: f32) -> AABB {
        let r = Vec2::new(amount, amount);
        AABB::new(self.min - r, self.max + r)
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }

    /// Check if `other` lies entirely within this AABB, edges included
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.min.y <= other.min.y &&
        other.max.x <= self.max.x && other.max.y <= self.max.y
    }

    /// Check if this AABB overlaps another AABB, touching edges included
    pub fn overlaps(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// Cast a segment against the box using the slab method
    ///
    /// Returns `None` when the segment starts inside the box, misses it, or
    /// reaches it beyond `input.max_fraction`.
    pub fn ray_cast(&self, input: &RayCastInput) -> Option<RayCastOutput> {
        let mut tmin = f32::MIN;
        let mut tmax = f32::MAX;
        let p = input.p1;
        let d = input.p2 - input.p1;
        let mut normal = Vec2::zeros();

        for axis in 0..2 {
            if d[axis].abs() < f32::EPSILON {
                if p[axis] < self.min[axis] || self.max[axis] < p[axis] {
                    return None;
                }
                continue;
            }

            let inv_d = 1.0 / d[axis];
            let mut t1 = (self.min[axis] - p[axis]) * inv_d;
            let mut t2 = (self.max[axis] - p[axis]) * inv_d;
            let mut s = -1.0;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
                s = 1.0;
            }

            if t1 > tmin {
                normal = Vec2::zeros();
                normal[axis] = s;
                tmin = t1;
            }
            tmax = tmax.min(t2);
            if tmin > tmax {
                return None;
            }
        }

        if tmin < 0.0 || input.max_fraction < tmin {
            return None;
        }

        Some(RayCastOutput { normal, fraction: tmin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> AABB {
        AABB::from_coords(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_contains_is_inclusive_on_edges() {
        let area = unit_box();
        assert!(area.contains(&area));
        assert!(area.contains(&AABB::from_coords(0.0, 2.0, 3.0, 10.0)));
        assert!(!area.contains(&AABB::from_coords(-0.001, 2.0, 3.0, 4.0)));
        assert!(!area.contains(&AABB::from_coords(8.0, 8.0, 15.0, 15.0)));
    }

    #[test]
    fn test_overlap_counts_touching_edges() {
        let area = unit_box();
        assert!(area.overlaps(&AABB::from_coords(10.0, 0.0, 12.0, 2.0)));
        assert!(!area.overlaps(&AABB::from_coords(10.001, 0.0, 12.0, 2.0)));
        assert!(area.overlaps(&AABB::from_coords(8.0, 8.0, 15.0, 15.0)));
    }

    #[test]
    fn test_combine() {
        let a = AABB::from_coords(0.0, 0.0, 1.0, 1.0);
        let b = AABB::from_coords(3.0, -2.0, 4.0, 0.5);
        let c = a.combine(&b);
        assert_eq!(c, AABB::from_coords(0.0, -2.0, 4.0, 1.0));
        assert!(c.contains(&a) && c.contains(&b));
    }

    #[test]
    fn test_validity() {
        assert!(unit_box().is_valid());
        assert!(!AABB::from_coords(1.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!AABB::from_coords(f32::NAN, 0.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn test_ray_cast_hits_near_face() {
        let input = RayCastInput::new(Vec2::new(-5.0, 5.0), Vec2::new(5.0, 5.0), 1.0);
        let hit = unit_box().ray_cast(&input).unwrap();
        assert_relative_eq!(hit.fraction, 0.5);
        assert_relative_eq!(hit.normal.x, -1.0);
        assert_relative_eq!(hit.normal.y, 0.0);
    }

    #[test]
    fn test_ray_cast_misses() {
        let input = RayCastInput::new(Vec2::new(-5.0, 15.0), Vec2::new(5.0, 15.0), 1.0);
        assert!(unit_box().ray_cast(&input).is_none());

        let short = RayCastInput::new(Vec2::new(-5.0, 5.0), Vec2::new(5.0, 5.0), 0.25);
        assert!(unit_box().ray_cast(&short).is_none());
    }
}
