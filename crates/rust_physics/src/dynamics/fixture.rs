//! Fixtures attach a shape to a body and mirror it into the broad phase
//!
//! A fixture owns one [`FixtureProxy`] per shape child. The proxies are
//! allocated when the fixture is registered and indexed only while the
//! owning body is enabled.

use std::fmt;

use crate::collision::{RayCastInput, RayCastOutput, Shape, AABB};
use crate::config::FixtureDefaults;
use crate::dynamics::body::BodyId;
use crate::dynamics::contact::ContactManager;
use crate::dynamics::events::FixtureEvents;
use crate::dynamics::filter::{Category, CollisionFilter};
use crate::dynamics::tag::UserTag;
use crate::error::PhysicsError;
use crate::foundation::collections::IdAllocator;
use crate::foundation::math::{Transform2, Vec2};
use crate::spatial::{BroadPhase, ProxyId, ProxyTag};

static FIXTURE_IDS: IdAllocator = IdAllocator::new(1);

/// Process-unique fixture identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureId(u32);

impl FixtureId {
    pub(crate) fn next() -> Self {
        Self(FIXTURE_IDS.allocate())
    }

    /// Wrap a raw id
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw id
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Built but not attached to any body store
    Unregistered,
    /// Attached; proxies are allocated
    Registered,
    /// Torn down; every operation except inspection fails
    Destroyed,
}

/// Broad-phase entry for one shape child
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureProxy {
    /// Tight world-space bounds of the child
    pub aabb: AABB,
    /// Index handle; `None` while the child is not indexed
    pub proxy_id: Option<ProxyId>,
    /// Owning fixture
    pub fixture: FixtureId,
    /// Shape child index
    pub child_index: usize,
}

/// Shape attachment with filtering and material state
#[derive(Debug)]
pub struct Fixture {
    id: FixtureId,
    body: BodyId,
    shape: Option<Shape>,
    filter: CollisionFilter,
    ignore_ccd_with: Category,
    is_sensor: bool,
    friction: f32,
    restitution: f32,
    tag: Option<UserTag>,
    proxies: Vec<FixtureProxy>,
    events: FixtureEvents,
    state: FixtureState,
}

impl Fixture {
    pub(crate) fn new(body: BodyId, shape: Shape, defaults: &FixtureDefaults) -> Self {
        Self::with_id(FixtureId::next(), body, shape, defaults)
    }

    fn with_id(id: FixtureId, body: BodyId, shape: Shape, defaults: &FixtureDefaults) -> Self {
        Self {
            id,
            body,
            shape: Some(shape),
            filter: CollisionFilter::new(defaults.categories(), defaults.collides_with()),
            ignore_ccd_with: defaults.ignore_ccd_with(),
            is_sensor: false,
            friction: defaults.friction,
            restitution: defaults.restitution,
            tag: None,
            proxies: Vec::new(),
            events: FixtureEvents::default(),
            state: FixtureState::Unregistered,
        }
    }

    /// Unique id
    pub fn id(&self) -> FixtureId {
        self.id
    }

    /// Owning body
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Attached shape; `None` once destroyed
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Collision filter state
    pub fn filter(&self) -> &CollisionFilter {
        &self.filter
    }

    /// Categories excluded from continuous collision
    pub fn ignore_ccd_with(&self) -> Category {
        self.ignore_ccd_with
    }

    /// Sensors detect overlap but produce no response
    pub fn is_sensor(&self) -> bool {
        self.is_sensor
    }

    /// Coulomb friction coefficient
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Restitution
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// User payload
    pub fn tag(&self) -> Option<&UserTag> {
        self.tag.as_ref()
    }

    /// Allocated proxies, one per shape child once registered
    pub fn proxies(&self) -> &[FixtureProxy] {
        &self.proxies
    }

    /// Number of proxies currently indexed in the broad phase
    pub fn proxy_count(&self) -> usize {
        self.proxies.iter().filter(|proxy| proxy.proxy_id.is_some()).count()
    }

    /// Lifecycle state
    pub fn state(&self) -> FixtureState {
        self.state
    }

    /// Whether the fixture has been torn down
    pub fn is_destroyed(&self) -> bool {
        self.state == FixtureState::Destroyed
    }

    /// Collision callbacks
    pub fn events(&self) -> &FixtureEvents {
        &self.events
    }

    /// Mutable collision callbacks
    pub fn events_mut(&mut self) -> &mut FixtureEvents {
        &mut self.events
    }

    fn live_shape(&self) -> Result<&Shape, PhysicsError> {
        match (&self.shape, self.state) {
            (Some(shape), FixtureState::Unregistered | FixtureState::Registered) => Ok(shape),
            _ => Err(PhysicsError::FixtureDestroyed(self.id)),
        }
    }

    fn ensure_live(&self) -> Result<(), PhysicsError> {
        self.live_shape().map(|_| ())
    }

    /// Set the friction coefficient
    pub fn set_friction(&mut self, friction: f32) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        if friction.is_nan() {
            return Err(PhysicsError::NotANumber { field: "friction" });
        }
        self.friction = friction;
        Ok(())
    }

    /// Set the restitution
    pub fn set_restitution(&mut self, restitution: f32) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        if restitution.is_nan() {
            return Err(PhysicsError::NotANumber { field: "restitution" });
        }
        self.restitution = restitution;
        Ok(())
    }

    /// Attach or clear the user payload
    pub fn set_tag(&mut self, tag: Option<UserTag>) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.tag = tag;
        Ok(())
    }

    /// Whether a world-space point lies inside the shape under `xf`
    pub fn test_point(&self, xf: &Transform2, point: Vec2) -> Result<bool, PhysicsError> {
        Ok(self.live_shape()?.test_point(xf, point))
    }

    /// Cast a ray against one shape child under `xf`
    pub fn ray_cast(
        &self,
        input: &RayCastInput,
        xf: &Transform2,
        child_index: usize,
    ) -> Result<Option<RayCastOutput>, PhysicsError> {
        let shape = self.live_shape()?;
        self.check_child(child_index, shape.child_count())?;
        Ok(shape.ray_cast(input, xf, child_index))
    }

    /// Tight bounds of one child as of the last synchronization
    pub fn get_aabb(&self, child_index: usize) -> Result<AABB, PhysicsError> {
        self.ensure_live()?;
        self.check_child(child_index, self.proxies.len())?;
        Ok(self.proxies[child_index].aabb)
    }

    fn check_child(&self, index: usize, count: usize) -> Result<(), PhysicsError> {
        if index < count {
            Ok(())
        } else {
            Err(PhysicsError::ChildIndexOutOfRange {
                fixture: self.id,
                index,
                count,
            })
        }
    }

    pub(crate) fn filter_mut(&mut self) -> Result<&mut CollisionFilter, PhysicsError> {
        self.ensure_live()?;
        Ok(&mut self.filter)
    }

    pub(crate) fn set_ignore_ccd_with(&mut self, categories: Category) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.ignore_ccd_with = categories;
        Ok(())
    }

    pub(crate) fn set_sensor(&mut self, sensor: bool) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        self.is_sensor = sensor;
        Ok(())
    }

    pub(crate) fn set_density(&mut self, density: f32) -> Result<(), PhysicsError> {
        self.ensure_live()?;
        if density.is_nan() {
            return Err(PhysicsError::NotANumber { field: "density" });
        }
        if let Some(shape) = self.shape.as_mut() {
            shape.density = density;
        }
        Ok(())
    }

    pub(crate) fn set_body(&mut self, body: BodyId) {
        self.body = body;
    }

    /// Allocate one proxy per child and index them if the body is enabled
    pub(crate) fn register(&mut self, broad_phase: &mut dyn BroadPhase, xf: &Transform2, enabled: bool) {
        let Some(shape) = self.shape.as_ref() else {
            return;
        };
        self.proxies = (0..shape.child_count())
            .map(|child_index| FixtureProxy {
                aabb: shape.compute_aabb(xf, child_index),
                proxy_id: None,
                fixture: self.id,
                child_index,
            })
            .collect();
        self.state = FixtureState::Registered;
        if enabled {
            self.create_proxies(broad_phase, xf);
        }
    }

    pub(crate) fn create_proxies(&mut self, broad_phase: &mut dyn BroadPhase, xf: &Transform2) {
        let Some(shape) = self.shape.as_ref() else {
            return;
        };
        for proxy in &mut self.proxies {
            if proxy.proxy_id.is_some() {
                continue;
            }
            proxy.aabb = shape.compute_aabb(xf, proxy.child_index);
            let tag = ProxyTag {
                body: self.body,
                fixture: self.id,
                child_index: proxy.child_index,
            };
            proxy.proxy_id = Some(broad_phase.add_proxy(proxy.aabb, tag));
        }
    }

    pub(crate) fn destroy_proxies(&mut self, broad_phase: &mut dyn BroadPhase) {
        for proxy in &mut self.proxies {
            if let Some(proxy_id) = proxy.proxy_id.take() {
                broad_phase.remove_proxy(proxy_id);
            }
        }
    }

    /// Move every indexed proxy to cover the sweep from `xf1` to `xf2`
    pub(crate) fn synchronize(&mut self, broad_phase: &mut dyn BroadPhase, xf1: &Transform2, xf2: &Transform2) {
        let Some(shape) = self.shape.as_ref() else {
            return;
        };
        let displacement = xf2.position - xf1.position;
        for proxy in &mut self.proxies {
            let Some(proxy_id) = proxy.proxy_id else {
                continue;
            };
            let from = shape.compute_aabb(xf1, proxy.child_index);
            let to = shape.compute_aabb(xf2, proxy.child_index);
            proxy.aabb = from.combine(&to);
            broad_phase.move_proxy(proxy_id, proxy.aabb, displacement);
        }
    }

    /// Flag this fixture's contacts and queue its proxies for new pairs
    pub(crate) fn refilter(&self, contacts: &mut ContactManager, broad_phase: &mut dyn BroadPhase) {
        contacts.flag_for_filtering(self.id);
        for proxy_id in self.proxies.iter().filter_map(|proxy| proxy.proxy_id) {
            broad_phase.touch_proxy(proxy_id);
        }
    }

    /// Tear down; proxies must already be out of the broad phase
    pub(crate) fn destroy(&mut self) -> Result<(), PhysicsError> {
        let count = self.proxy_count();
        if count > 0 {
            return Err(PhysicsError::ProxiesStillIndexed { fixture: self.id, count });
        }
        self.proxies.clear();
        self.shape = None;
        self.tag = None;
        self.events.clear();
        self.state = FixtureState::Destroyed;
        Ok(())
    }

    /// Whether two fixtures carry the same configuration
    ///
    /// Identity, owning body, shape and registration state are not compared.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.filter == other.filter
            && self.ignore_ccd_with == other.ignore_ccd_with
            && self.is_sensor == other.is_sensor
            && self.friction == other.friction
            && self.restitution == other.restitution
            && self.tag == other.tag
    }

    /// Unregistered copy for `body` with a fresh id
    ///
    /// Hand it to [`World::add_fixture`](crate::dynamics::World::add_fixture)
    /// to attach it.
    pub fn clone_onto(&self, body: BodyId) -> Result<Self, PhysicsError> {
        self.ensure_live()?;
        Ok(self.copy_with_id(FixtureId::next(), body))
    }

    /// Unregistered copy that keeps this fixture's id, for store migration
    pub(crate) fn migration_copy(&self) -> Self {
        self.copy_with_id(self.id, self.body)
    }

    fn copy_with_id(&self, id: FixtureId, body: BodyId) -> Self {
        Self {
            id,
            body,
            shape: self.shape.clone(),
            filter: self.filter.clone(),
            ignore_ccd_with: self.ignore_ccd_with,
            is_sensor: self.is_sensor,
            friction: self.friction,
            restitution: self.restitution,
            tag: self.tag.clone(),
            proxies: Vec::new(),
            events: FixtureEvents::default(),
            state: FixtureState::Unregistered,
        }
    }
}
