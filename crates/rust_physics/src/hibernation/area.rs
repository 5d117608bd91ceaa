//! Active areas
//!
//! An active area keeps every body it touches simulated. Free-floating
//! areas follow an external position such as a player and live until
//! removed. Body-tracking areas escort a moving body that left the other
//! areas and expire after a fixed lifetime.

use crate::collision::AABB;
use crate::dynamics::{BodyId, World};
use crate::foundation::collections::new_key_type;
use crate::foundation::math::Vec2;
use crate::hibernation::area_body::AreaBody;

new_key_type! {
    /// Handle of an active area inside a hibernation manager
    pub struct AreaId;
}

/// The source driving an area's bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActiveAreaKind {
    /// Centered on an externally supplied position
    FreeFloating {
        /// Center of the area
        position: Vec2,
        /// Half the width and height
        half_extents: Vec2,
    },
    /// Follows a body's broad-phase bounds
    BodyTracking {
        /// The escorted body
        body: BodyId,
        /// Clock time the area was created at
        created_at: f64,
    },
}

/// A region that keeps the bodies it touches awake
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveArea {
    aabb: AABB,
    pub(crate) bodies: Vec<AreaBody>,
    kind: ActiveAreaKind,
}

impl ActiveArea {
    /// Area centered on `position`
    pub fn free_floating(position: Vec2, half_extents: Vec2) -> Self {
        Self {
            aabb: AABB::from_center_half_extents(position, half_extents),
            bodies: Vec::new(),
            kind: ActiveAreaKind::FreeFloating { position, half_extents },
        }
    }

    /// Escort for `body`, which starts out as a settled member
    pub(crate) fn body_tracking(body: BodyId, aabb: AABB, created_at: f64) -> Self {
        Self {
            aabb,
            bodies: vec![AreaBody::settled(body)],
            kind: ActiveAreaKind::BodyTracking { body, created_at },
        }
    }

    /// Current bounds
    pub fn aabb(&self) -> AABB {
        self.aabb
    }

    /// Membership records
    pub fn bodies(&self) -> &[AreaBody] {
        &self.bodies
    }

    /// Variant and its driving data
    pub fn kind(&self) -> &ActiveAreaKind {
        &self.kind
    }

    /// The escorted body, for body-tracking areas
    pub fn tracked_body(&self) -> Option<BodyId> {
        match self.kind {
            ActiveAreaKind::BodyTracking { body, .. } => Some(body),
            ActiveAreaKind::FreeFloating { .. } => None,
        }
    }

    /// Whether `body` has a membership record here
    pub fn contains_body(&self, body: BodyId) -> bool {
        self.bodies.iter().any(|record| record.body == body)
    }

    pub(crate) fn remove_body(&mut self, body: BodyId) {
        self.bodies.retain(|record| record.body != body);
    }

    /// Move a free-floating area; returns `false` for tracking areas
    pub fn set_position(&mut self, position: Vec2) -> bool {
        match &mut self.kind {
            ActiveAreaKind::FreeFloating {
                position: current,
                half_extents,
            } => {
                *current = position;
                self.aabb = AABB::from_center_half_extents(position, *half_extents);
                true
            }
            ActiveAreaKind::BodyTracking { .. } => false,
        }
    }

    /// Seconds since creation; free-floating areas have no age
    pub fn age_secs(&self, now: f64) -> Option<f64> {
        match self.kind {
            ActiveAreaKind::BodyTracking { created_at, .. } => Some(now - created_at),
            ActiveAreaKind::FreeFloating { .. } => None,
        }
    }

    /// Older than `lifetime`; every member is then forced out
    pub fn is_expired(&self, now: f64, lifetime: f64) -> bool {
        self.age_secs(now).is_some_and(|age| age > lifetime)
    }

    /// Reached `lifetime` with no members left
    pub fn is_reclaimable(&self, now: f64, lifetime: f64) -> bool {
        self.bodies.is_empty() && self.age_secs(now).is_some_and(|age| age >= lifetime)
    }

    /// Recompute the bounds from the driving source
    ///
    /// A tracked body is looked up in the simulated world first, then the
    /// dormant one; if it has no bounds in either the previous bounds stay.
    pub(crate) fn refresh(&mut self, active: &World, hibernated: &World) {
        match self.kind {
            ActiveAreaKind::FreeFloating { position, half_extents } => {
                self.aabb = AABB::from_center_half_extents(position, half_extents);
            }
            ActiveAreaKind::BodyTracking { body, .. } => {
                if let Some(aabb) = active
                    .body_fat_aabb(body)
                    .or_else(|| hibernated.body_fat_aabb(body))
                {
                    self.aabb = aabb;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hibernation::area_body::AreaBodyStatus;

    #[test]
    fn test_free_floating_moves() {
        let mut area = ActiveArea::free_floating(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
        assert_eq!(area.aabb(), AABB::from_coords(0.0, 0.0, 10.0, 10.0));
        assert!(area.set_position(Vec2::new(6.0, 5.0)));
        assert_eq!(area.aabb(), AABB::from_coords(1.0, 0.0, 11.0, 10.0));
        assert!(!area.is_expired(1.0e9, 3.0));
        assert!(area.tracked_body().is_none());
    }

    #[test]
    fn test_tracking_area_lifetime() {
        let body = BodyId::from_raw(4);
        let mut area = ActiveArea::body_tracking(body, AABB::from_coords(0.0, 0.0, 1.0, 1.0), 10.0);
        assert_eq!(area.tracked_body(), Some(body));
        assert_eq!(area.bodies()[0].position_status, AreaBodyStatus::TotallyIn);
        assert!(!area.set_position(Vec2::zeros()));

        assert!(!area.is_expired(13.0, 3.0));
        assert!(area.is_expired(13.5, 3.0));
        assert!(!area.is_reclaimable(13.5, 3.0));

        area.remove_body(body);
        assert!(area.is_reclaimable(13.0, 3.0));
        assert!(!area.is_reclaimable(12.0, 3.0));
    }
}
