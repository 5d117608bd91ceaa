//! Hibernation manager
//!
//! Owns the dormant world and the set of active areas, and once per
//! maintenance tick moves bodies between the dormant world and the
//! simulated one the caller passes in.

use std::collections::HashSet;

use thiserror::Error;

use crate::collision::AABB;
use crate::config::HibernationConfig;
use crate::dynamics::{BodyId, World};
use crate::error::PhysicsError;
use crate::foundation::collections::SlotMap;
use crate::foundation::math::Vec2;
use crate::foundation::time::{Clock, SystemClock};
use crate::hibernation::area::{ActiveArea, AreaId};
use crate::hibernation::area_body::{AreaBody, AreaBodyStatus};

/// Hibernation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HibernationError {
    /// The simulated world is mid-step
    #[error("active world is locked")]
    ActiveWorldLocked,

    /// The dormant world is mid-step
    #[error("hibernated world is locked")]
    HibernatedWorldLocked,

    /// No area with this handle
    #[error("active area {0:?} not found")]
    AreaNotFound(AreaId),

    /// The area is not free-floating and cannot be positioned
    #[error("active area {0:?} is not free-floating")]
    NotFreeFloating(AreaId),

    /// The body already has an escort
    #[error("body {0} already has a tracking area")]
    AlreadyTracked(BodyId),

    /// Store operation failed
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HibernationReport {
    /// Bodies moved from the dormant world into the simulated one
    pub woken: Vec<BodyId>,
    /// Bodies moved from the simulated world into the dormant one
    pub hibernated: Vec<BodyId>,
    /// Body-tracking areas created
    pub areas_created: usize,
    /// Body-tracking areas removed
    pub areas_removed: usize,
}

impl HibernationReport {
    /// Whether the tick changed nothing
    pub fn is_empty(&self) -> bool {
        self.woken.is_empty() && self.hibernated.is_empty() && self.areas_created == 0 && self.areas_removed == 0
    }
}

/// Moves bodies between a simulated world and a dormant one based on
/// their proximity to active areas
pub struct HibernationManager {
    hibernated: World,
    areas: SlotMap<AreaId, ActiveArea>,
    bodies_to_hibernate: Vec<BodyId>,
    config: HibernationConfig,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for HibernationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HibernationManager")
            .field("hibernated", &self.hibernated)
            .field("areas", &self.areas.len())
            .field("bodies_to_hibernate", &self.bodies_to_hibernate.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn invariant_violation(message: &str) -> ! {
    log::error!("hibernation invariant violated: {}", message);
    panic!("hibernation invariant violated: {message}");
}

impl HibernationManager {
    /// Manager for `active` using wall-clock time
    pub fn new(active: &World) -> Self {
        Self::with_clock(active, Box::new(SystemClock::new()))
    }

    /// Manager for `active` reading time from `clock`
    ///
    /// Every body already in `active` is scheduled for hibernation; those
    /// that end the first tick inside an area are spared.
    pub fn with_clock(active: &World, clock: Box<dyn Clock>) -> Self {
        let config = *active.config();
        let bodies_to_hibernate = active.body_ids();
        log::info!(
            "hibernation manager created; {} bodies scheduled for hibernation",
            bodies_to_hibernate.len()
        );
        Self {
            hibernated: World::new("hibernated", config),
            areas: SlotMap::with_key(),
            bodies_to_hibernate,
            config: config.hibernation,
            clock,
        }
    }

    /// The dormant world
    pub fn hibernated_world(&self) -> &World {
        &self.hibernated
    }

    /// The dormant world, for adding bodies that start out asleep
    pub fn hibernated_world_mut(&mut self) -> &mut World {
        &mut self.hibernated
    }

    /// Bodies waiting for the next hibernate pass
    pub fn pending_hibernation(&self) -> &[BodyId] {
        &self.bodies_to_hibernate
    }

    /// Add a free-floating area
    pub fn add_area(&mut self, position: Vec2, half_extents: Vec2) -> AreaId {
        self.areas.insert(ActiveArea::free_floating(position, half_extents))
    }

    /// Move a free-floating area
    pub fn set_area_position(&mut self, id: AreaId, position: Vec2) -> Result<(), HibernationError> {
        let area = self.areas.get_mut(id).ok_or(HibernationError::AreaNotFound(id))?;
        if area.set_position(position) {
            Ok(())
        } else {
            Err(HibernationError::NotFreeFloating(id))
        }
    }

    /// Remove an area; members left in no other area hibernate next tick
    pub fn remove_area(&mut self, id: AreaId) -> Result<ActiveArea, HibernationError> {
        let area = self.areas.remove(id).ok_or(HibernationError::AreaNotFound(id))?;
        self.schedule_orphans(&area, None);
        Ok(area)
    }

    /// Start escorting a body of `active` with its own tracking area
    pub fn track_body(&mut self, active: &World, body: BodyId) -> Result<AreaId, HibernationError> {
        if self.tracking_area_for(body).is_some() {
            return Err(HibernationError::AlreadyTracked(body));
        }
        let state = active.body(body).ok_or(PhysicsError::BodyNotFound(body))?;
        let aabb = active
            .body_fat_aabb(body)
            .unwrap_or_else(|| AABB::new(state.position(), state.position()));
        Ok(self
            .areas
            .insert(ActiveArea::body_tracking(body, aabb, self.clock.now_secs())))
    }

    /// Area by handle
    pub fn area(&self, id: AreaId) -> Option<&ActiveArea> {
        self.areas.get(id)
    }

    /// Every area with its handle
    pub fn areas(&self) -> impl Iterator<Item = (AreaId, &ActiveArea)> + '_ {
        self.areas.iter()
    }

    /// Number of areas of either kind
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// The tracking area escorting `body`, if any
    pub fn tracking_area_for(&self, body: BodyId) -> Option<AreaId> {
        self.areas
            .iter()
            .find(|(_, area)| area.tracked_body() == Some(body))
            .map(|(id, _)| id)
    }

    /// Whether any area lists `body` as a member
    pub fn is_in_any_area(&self, body: BodyId) -> bool {
        self.areas.values().any(|area| area.contains_body(body))
    }

    fn schedule(&mut self, body: BodyId) {
        if !self.bodies_to_hibernate.contains(&body) {
            self.bodies_to_hibernate.push(body);
        }
    }

    fn schedule_orphans(&mut self, removed: &ActiveArea, keep: Option<BodyId>) {
        for record in removed.bodies() {
            if Some(record.body) != keep && !self.is_in_any_area(record.body) {
                self.schedule(record.body);
            }
        }
    }

    /// Run one maintenance tick
    ///
    /// Must be called between simulation steps; a locked world fails the
    /// whole tick before anything is touched.
    pub fn update(&mut self, active: &mut World) -> Result<HibernationReport, HibernationError> {
        if active.is_locked() {
            return Err(HibernationError::ActiveWorldLocked);
        }
        if self.hibernated.is_locked() {
            return Err(HibernationError::HibernatedWorldLocked);
        }

        let now = self.clock.now_secs();
        let lifetime = self.config.tracking_area_lifetime_secs;
        let mut report = HibernationReport::default();

        self.prune_reclaimable(now, lifetime, &mut report);
        for area in self.areas.values_mut() {
            area.refresh(active, &self.hibernated);
        }
        self.wake(active, &mut report);

        let ids: Vec<AreaId> = self.areas.keys().collect();
        self.classify(active, &ids, now, lifetime);
        self.apply_transitions(active, &ids, now, &mut report);
        self.schedule_uncovered(active);
        self.hibernate(active, &mut report);
        self.reclaim_expired(now, lifetime, &mut report);

        log::debug!(
            "hibernation tick: {} woken, {} hibernated, {} tracking areas created, {} removed",
            report.woken.len(),
            report.hibernated.len(),
            report.areas_created,
            report.areas_removed
        );
        Ok(report)
    }

    fn prune_reclaimable(&mut self, now: f64, lifetime: f64, report: &mut HibernationReport) {
        self.areas.retain(|_, area| {
            let keep = !area.is_reclaimable(now, lifetime);
            if !keep {
                report.areas_removed += 1;
            }
            keep
        });
    }

    fn wake(&mut self, active: &mut World, report: &mut HibernationReport) {
        let bounds: Vec<_> = self.areas.values().map(ActiveArea::aabb).collect();
        for aabb in bounds {
            for body in self.hibernated.find_bodies_in_aabb(&aabb) {
                if let Err(err) = self.hibernated.transfer_body(body, active) {
                    invariant_violation(&format!("could not wake body {}: {}", body, err));
                }
                log::trace!("woke body {}", body);
                report.woken.push(body);
            }
        }
    }

    fn classify(&mut self, active: &World, ids: &[AreaId], now: f64, lifetime: f64) {
        for &id in ids {
            let Some(area) = self.areas.get_mut(id) else {
                continue;
            };
            let bounds = area.aabb();
            let expired = area.is_expired(now, lifetime);
            let overlapping: HashSet<BodyId> = active.find_bodies_in_aabb(&bounds).into_iter().collect();

            for &body in &overlapping {
                if !area.contains_body(body) {
                    area.bodies.push(AreaBody::new(body));
                }
            }

            for record in &mut area.bodies {
                let status = AreaBodyStatus::classify(
                    &bounds,
                    active.body_fat_aabb(record.body),
                    overlapping.contains(&record.body),
                    expired,
                );
                record.advance(status);
            }
        }
    }

    fn apply_transitions(&mut self, active: &World, ids: &[AreaId], now: f64, report: &mut HibernationReport) {
        for &id in ids {
            let Some(area) = self.areas.get(id) else {
                continue;
            };
            let records: Vec<AreaBody> = area.bodies().iter().rev().copied().collect();

            for record in records {
                if record.position_status == AreaBodyStatus::Invalid {
                    invariant_violation(&format!("body {} left unclassified", record.body));
                }
                if !record.has_changed() {
                    continue;
                }

                match record.position_status {
                    AreaBodyStatus::TotallyIn => self.retire_redundant_escort(id, record.body, report),
                    AreaBodyStatus::PartiallyIn | AreaBodyStatus::TotallyOut => {
                        self.escort_if_moving(active, record.body, now, report);
                    }
                    AreaBodyStatus::Invalid => {}
                }

                if record.position_status == AreaBodyStatus::TotallyOut {
                    if let Some(area) = self.areas.get_mut(id) {
                        area.remove_body(record.body);
                    }
                    if !self.is_in_any_area(record.body) {
                        self.schedule(record.body);
                    }
                }
            }
        }
    }

    fn retire_redundant_escort(&mut self, covering: AreaId, body: BodyId, report: &mut HibernationReport) {
        let redundant: Vec<AreaId> = self
            .areas
            .iter()
            .filter(|(id, area)| *id != covering && area.tracked_body() == Some(body) && area.contains_body(body))
            .map(|(id, _)| id)
            .collect();

        match redundant.as_slice() {
            [] => {}
            [escort] => {
                if let Some(removed) = self.areas.remove(*escort) {
                    log::trace!("body {} covered again; dropping its tracking area", body);
                    report.areas_removed += 1;
                    self.schedule_orphans(&removed, Some(body));
                }
            }
            many => invariant_violation(&format!("body {} has {} tracking areas", body, many.len())),
        }
    }

    fn escort_if_moving(&mut self, active: &World, body: BodyId, now: f64, report: &mut HibernationReport) {
        let Some(state) = active.body(body) else {
            return;
        };
        if !state.is_moving() || self.tracking_area_for(body).is_some() {
            return;
        }
        let Some(aabb) = active.body_fat_aabb(body) else {
            return;
        };
        self.areas.insert(ActiveArea::body_tracking(body, aabb, now));
        log::trace!("body {} is moving out of coverage; escorting it", body);
        report.areas_created += 1;
    }

    /// Simulated bodies no area lists, such as ones created since the last tick
    fn schedule_uncovered(&mut self, active: &World) {
        for body in active.body_ids() {
            if !self.is_in_any_area(body) {
                self.schedule(body);
            }
        }
    }

    fn hibernate(&mut self, active: &mut World, report: &mut HibernationReport) {
        let scheduled = std::mem::take(&mut self.bodies_to_hibernate);
        for body in scheduled {
            if self.is_in_any_area(body) || !active.contains_body(body) {
                continue;
            }
            if let Err(err) = active.transfer_body(body, &mut self.hibernated) {
                invariant_violation(&format!("could not hibernate body {}: {}", body, err));
            }
            log::trace!("hibernated body {}", body);
            report.hibernated.push(body);
        }
    }

    fn reclaim_expired(&mut self, now: f64, lifetime: f64, report: &mut HibernationReport) {
        let finished: Vec<AreaId> = self
            .areas
            .iter()
            .filter(|(_, area)| area.is_expired(now, lifetime) || area.is_reclaimable(now, lifetime))
            .map(|(id, _)| id)
            .collect();

        for id in finished {
            if let Some(area) = self.areas.remove(id) {
                if !area.bodies().is_empty() {
                    invariant_violation(&format!(
                        "expired tracking area still holds {} bodies",
                        area.bodies().len()
                    ));
                }
                report.areas_removed += 1;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_area_for_test(&mut self, area: ActiveArea) -> AreaId {
        self.areas.insert(area)
    }
}
