//! Membership of one body in one active area

use crate::collision::AABB;
use crate::dynamics::BodyId;

/// Where a body sits relative to an area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AreaBodyStatus {
    /// Not yet classified
    #[default]
    Invalid,
    /// Bounds fully enclosed by the area
    TotallyIn,
    /// Bounds overlap the area without being enclosed
    PartiallyIn,
    /// No overlap, or the area has expired
    TotallyOut,
}

impl AreaBodyStatus {
    /// Classify a body against an area
    ///
    /// `body_aabb` is `None` when the body has no indexed bounds.
    pub fn classify(area: &AABB, body_aabb: Option<AABB>, overlapping: bool, area_expired: bool) -> Self {
        if area_expired || !overlapping {
            return Self::TotallyOut;
        }
        match body_aabb {
            Some(bounds) if area.contains(&bounds) => Self::TotallyIn,
            Some(bounds) if area.overlaps(&bounds) => Self::PartiallyIn,
            _ => Self::TotallyOut,
        }
    }
}

/// One body's status in one area across two consecutive ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaBody {
    /// The member
    pub body: BodyId,
    /// Status from this tick
    pub position_status: AreaBodyStatus,
    /// Status from the previous tick
    pub prior_status: AreaBodyStatus,
}

impl AreaBody {
    /// Unclassified record for a newly overlapping body
    pub fn new(body: BodyId) -> Self {
        Self {
            body,
            position_status: AreaBodyStatus::Invalid,
            prior_status: AreaBodyStatus::Invalid,
        }
    }

    /// Record already settled inside its area
    pub fn settled(body: BodyId) -> Self {
        Self {
            body,
            position_status: AreaBodyStatus::TotallyIn,
            prior_status: AreaBodyStatus::TotallyIn,
        }
    }

    /// Shift the current status to prior and store `status`
    pub fn advance(&mut self, status: AreaBodyStatus) {
        self.prior_status = self.position_status;
        self.position_status = status;
    }

    /// Whether the last [`AreaBody::advance`] changed the status
    pub fn has_changed(&self) -> bool {
        self.position_status != self.prior_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> AABB {
        AABB::from_coords(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_classify() {
        let inside = Some(AABB::from_coords(2.0, 2.0, 4.0, 4.0));
        let straddling = Some(AABB::from_coords(8.0, 8.0, 15.0, 15.0));
        let outside = Some(AABB::from_coords(20.0, 20.0, 25.0, 25.0));

        assert_eq!(AreaBodyStatus::classify(&area(), inside, true, false), AreaBodyStatus::TotallyIn);
        assert_eq!(AreaBodyStatus::classify(&area(), straddling, true, false), AreaBodyStatus::PartiallyIn);
        assert_eq!(AreaBodyStatus::classify(&area(), outside, false, false), AreaBodyStatus::TotallyOut);
        assert_eq!(AreaBodyStatus::classify(&area(), None, true, false), AreaBodyStatus::TotallyOut);
    }

    #[test]
    fn test_edges_count_as_inside() {
        let flush = Some(AABB::from_coords(0.0, 0.0, 10.0, 10.0));
        assert_eq!(AreaBodyStatus::classify(&area(), flush, true, false), AreaBodyStatus::TotallyIn);
    }

    #[test]
    fn test_expired_area_forces_out() {
        let inside = Some(AABB::from_coords(2.0, 2.0, 4.0, 4.0));
        assert_eq!(AreaBodyStatus::classify(&area(), inside, true, true), AreaBodyStatus::TotallyOut);
    }

    #[test]
    fn test_advance_tracks_change() {
        let mut record = AreaBody::new(BodyId::from_raw(1));
        record.advance(AreaBodyStatus::TotallyIn);
        assert!(record.has_changed());
        record.advance(AreaBodyStatus::TotallyIn);
        assert!(!record.has_changed());
        assert_eq!(record.prior_status, AreaBodyStatus::TotallyIn);
    }
}
