//! The body store
//!
//! A [`World`] owns bodies, their fixtures, the broad phase indexing those
//! fixtures and the contact bookkeeping. Structural changes are refused
//! while the world is locked mid-step.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::collision::{RayCastInput, RayCastOutput, Shape, AABB};
use crate::config::PhysicsConfig;
use crate::dynamics::body::{Body, BodyDef, BodyId};
use crate::dynamics::contact::ContactManager;
use crate::dynamics::events::FixtureEvents;
use crate::dynamics::filter::Category;
use crate::dynamics::fixture::{Fixture, FixtureId, FixtureState};
use crate::dynamics::tag::UserTag;
use crate::error::PhysicsError;
use crate::foundation::math::{Transform2, Vec2};
use crate::spatial::{BroadPhase, SimpleBroadPhase};

type FixtureSink = Box<dyn FnMut(BodyId, FixtureId) + Send>;

/// Store of bodies and fixtures backed by a broad phase
pub struct World {
    label: String,
    config: PhysicsConfig,
    bodies: BTreeMap<BodyId, Body>,
    broad_phase: Box<dyn BroadPhase>,
    contacts: ContactManager,
    locked: bool,
    new_fixture: bool,
    fixture_added: Vec<FixtureSink>,
    fixture_removed: Vec<FixtureSink>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("label", &self.label)
            .field("bodies", &self.bodies.len())
            .field("proxies", &self.broad_phase.proxy_count())
            .field("contacts", &self.contacts.len())
            .field("locked", &self.locked)
            .finish()
    }
}

impl World {
    /// Empty world using the linear broad phase
    pub fn new(label: impl Into<String>, config: PhysicsConfig) -> Self {
        let broad_phase = Box::new(SimpleBroadPhase::new(config.broad_phase));
        Self::with_broad_phase(label, config, broad_phase)
    }

    /// Empty world over a caller-supplied broad phase
    pub fn with_broad_phase(label: impl Into<String>, config: PhysicsConfig, broad_phase: Box<dyn BroadPhase>) -> Self {
        Self {
            label: label.into(),
            config,
            bodies: BTreeMap::new(),
            broad_phase,
            contacts: ContactManager::default(),
            locked: false,
            new_fixture: false,
            fixture_added: Vec::new(),
            fixture_removed: Vec::new(),
        }
    }

    /// Name used in logs and errors
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Configuration the world was built with
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Whether the world is mid-step
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Refuse structural changes until [`World::unlock`]
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Allow structural changes again
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    fn ensure_unlocked(&self) -> Result<(), PhysicsError> {
        if self.locked {
            Err(PhysicsError::WorldLocked(self.label.clone()))
        } else {
            Ok(())
        }
    }

    /// The spatial index
    pub fn broad_phase(&self) -> &dyn BroadPhase {
        self.broad_phase.as_ref()
    }

    /// Candidate contacts
    pub fn contacts(&self) -> &ContactManager {
        &self.contacts
    }

    /// Subscribe to fixture registration
    pub fn on_fixture_added(&mut self, sink: impl FnMut(BodyId, FixtureId) + Send + 'static) {
        self.fixture_added.push(Box::new(sink));
    }

    /// Subscribe to fixture teardown
    pub fn on_fixture_removed(&mut self, sink: impl FnMut(BodyId, FixtureId) + Send + 'static) {
        self.fixture_removed.push(Box::new(sink));
    }

    /// Read and clear the "a fixture was registered" flag
    pub fn take_new_fixture_flag(&mut self) -> bool {
        std::mem::take(&mut self.new_fixture)
    }

    // ---- bodies ----------------------------------------------------------

    /// Create a body with a fresh id
    pub fn create_body(&mut self, def: BodyDef) -> Result<BodyId, PhysicsError> {
        self.ensure_unlocked()?;
        let id = BodyId::next();
        self.bodies.insert(id, Body::from_def(id, def));
        Ok(id)
    }

    /// Detach a body, tearing down its fixtures and contacts
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, PhysicsError> {
        self.ensure_unlocked()?;
        let mut body = self.bodies.remove(&id).ok_or(PhysicsError::BodyNotFound(id))?;
        self.contacts.destroy_for_body(id);
        for fixture in &mut body.fixtures {
            fixture.destroy_proxies(self.broad_phase.as_mut());
            fixture.destroy()?;
            for sink in &mut self.fixture_removed {
                sink(id, fixture.id());
            }
        }
        Ok(body)
    }

    /// Body by id
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Whether the world holds `id`
    pub fn contains_body(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Number of bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Ids of every body in ascending order
    pub fn body_ids(&self) -> Vec<BodyId> {
        self.bodies.keys().copied().collect()
    }

    /// Every body in ascending id order
    pub fn bodies(&self) -> impl Iterator<Item = &Body> + '_ {
        self.bodies.values()
    }

    fn body_entry(&mut self, id: BodyId) -> Result<&mut Body, PhysicsError> {
        self.bodies.get_mut(&id).ok_or(PhysicsError::BodyNotFound(id))
    }

    /// Enable or disable a body; disabled bodies have no indexed proxies
    pub fn set_enabled(&mut self, id: BodyId, enabled: bool) -> Result<(), PhysicsError> {
        self.ensure_unlocked()?;
        let body = self.bodies.get_mut(&id).ok_or(PhysicsError::BodyNotFound(id))?;
        if body.enabled == enabled {
            return Ok(());
        }
        body.enabled = enabled;
        let xf = body.transform;
        for fixture in &mut body.fixtures {
            if enabled {
                fixture.create_proxies(self.broad_phase.as_mut(), &xf);
            } else {
                fixture.destroy_proxies(self.broad_phase.as_mut());
            }
        }
        if !enabled {
            self.contacts.destroy_for_body(id);
        }
        Ok(())
    }

    /// Teleport a body; proxies are refit to the new pose only
    pub fn set_transform(&mut self, id: BodyId, transform: Transform2) -> Result<(), PhysicsError> {
        self.ensure_unlocked()?;
        let body = self.bodies.get_mut(&id).ok_or(PhysicsError::BodyNotFound(id))?;
        body.transform = transform;
        for fixture in &mut body.fixtures {
            fixture.synchronize(self.broad_phase.as_mut(), &transform, &transform);
        }
        Ok(())
    }

    /// Move a body; proxies cover the sweep from the old pose
    pub fn move_body(&mut self, id: BodyId, transform: Transform2) -> Result<(), PhysicsError> {
        self.ensure_unlocked()?;
        let body = self.bodies.get_mut(&id).ok_or(PhysicsError::BodyNotFound(id))?;
        Self::sweep(self.broad_phase.as_mut(), body, transform);
        Ok(())
    }

    fn sweep(broad_phase: &mut dyn BroadPhase, body: &mut Body, transform: Transform2) {
        let from = body.transform;
        body.transform = transform;
        for fixture in &mut body.fixtures {
            fixture.synchronize(broad_phase, &from, &transform);
        }
    }

    /// Set linear velocity
    pub fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec2) -> Result<(), PhysicsError> {
        self.body_entry(id)?.linear_velocity = velocity;
        Ok(())
    }

    /// Set angular velocity
    pub fn set_angular_velocity(&mut self, id: BodyId, velocity: f32) -> Result<(), PhysicsError> {
        self.body_entry(id)?.angular_velocity = velocity;
        Ok(())
    }

    /// Set the sleep flag
    pub fn set_awake(&mut self, id: BodyId, awake: bool) -> Result<(), PhysicsError> {
        self.body_entry(id)?.awake = awake;
        Ok(())
    }

    /// Attach or clear a body's user payload
    pub fn set_body_tag(&mut self, id: BodyId, tag: Option<UserTag>) -> Result<(), PhysicsError> {
        self.body_entry(id)?.tag = tag;
        Ok(())
    }

    // ---- fixtures --------------------------------------------------------

    /// Create a fixture from `shape` with the configured defaults
    pub fn create_fixture(&mut self, body: BodyId, shape: Shape) -> Result<FixtureId, PhysicsError> {
        self.ensure_unlocked()?;
        if !self.bodies.contains_key(&body) {
            return Err(PhysicsError::BodyNotFound(body));
        }
        let fixture = Fixture::new(body, shape, &self.config.fixture);
        self.register_fixture(body, fixture)
    }

    /// Attach a detached fixture, e.g. one built by [`Fixture::clone_onto`],
    /// to the body it names
    pub fn add_fixture(&mut self, fixture: Fixture) -> Result<FixtureId, PhysicsError> {
        self.ensure_unlocked()?;
        if fixture.state() != FixtureState::Unregistered {
            return Err(PhysicsError::FixtureDestroyed(fixture.id()));
        }
        let body = fixture.body();
        if !self.bodies.contains_key(&body) {
            return Err(PhysicsError::BodyNotFound(body));
        }
        self.register_fixture(body, fixture)
    }

    fn register_fixture(&mut self, body_id: BodyId, mut fixture: Fixture) -> Result<FixtureId, PhysicsError> {
        let body = self.bodies.get_mut(&body_id).ok_or(PhysicsError::BodyNotFound(body_id))?;
        fixture.set_body(body_id);
        fixture.register(self.broad_phase.as_mut(), &body.transform, body.enabled);
        let id = fixture.id();
        let has_mass = fixture.shape().is_some_and(|shape| shape.density > 0.0);
        body.fixtures.push(fixture);
        if has_mass {
            body.reset_mass_data();
        }
        self.new_fixture = true;
        for sink in &mut self.fixture_added {
            sink(body_id, id);
        }
        Ok(id)
    }

    /// Tear down a fixture and hand back its destroyed remains
    pub fn destroy_fixture(&mut self, body: BodyId, fixture: FixtureId) -> Result<Fixture, PhysicsError> {
        self.ensure_unlocked()?;
        let owner = self.bodies.get_mut(&body).ok_or(PhysicsError::BodyNotFound(body))?;
        let index = owner
            .fixture_index(fixture)
            .ok_or(PhysicsError::FixtureNotFound { body, fixture })?;
        let mut removed = owner.fixtures.remove(index);
        owner.reset_mass_data();
        self.contacts.destroy_for_fixture(fixture);
        removed.destroy_proxies(self.broad_phase.as_mut());
        removed.destroy()?;
        for sink in &mut self.fixture_removed {
            sink(body, fixture);
        }
        Ok(removed)
    }

    /// Fixture by owner and id
    pub fn fixture(&self, body: BodyId, fixture: FixtureId) -> Result<&Fixture, PhysicsError> {
        self.bodies
            .get(&body)
            .ok_or(PhysicsError::BodyNotFound(body))?
            .fixture(fixture)
            .ok_or(PhysicsError::FixtureNotFound { body, fixture })
    }

    /// Mutable access to a fixture; filter changes are propagated
    pub fn fixture_mut(&mut self, body: BodyId, fixture: FixtureId) -> Result<FixtureMut<'_>, PhysicsError> {
        let owner = self.bodies.get_mut(&body).ok_or(PhysicsError::BodyNotFound(body))?;
        let index = owner
            .fixture_index(fixture)
            .ok_or(PhysicsError::FixtureNotFound { body, fixture })?;
        Ok(FixtureMut {
            body: owner,
            index,
            broad_phase: self.broad_phase.as_mut(),
            contacts: &mut self.contacts,
        })
    }

    /// Point test against a fixture at its body's current pose
    pub fn test_point(&self, body: BodyId, fixture: FixtureId, point: Vec2) -> Result<bool, PhysicsError> {
        let owner = self.bodies.get(&body).ok_or(PhysicsError::BodyNotFound(body))?;
        let target = owner.fixture(fixture).ok_or(PhysicsError::FixtureNotFound { body, fixture })?;
        target.test_point(&owner.transform, point)
    }

    /// Ray cast against one child of a fixture at its body's current pose
    pub fn ray_cast(
        &self,
        body: BodyId,
        fixture: FixtureId,
        input: &RayCastInput,
        child_index: usize,
    ) -> Result<Option<RayCastOutput>, PhysicsError> {
        let owner = self.bodies.get(&body).ok_or(PhysicsError::BodyNotFound(body))?;
        let target = owner.fixture(fixture).ok_or(PhysicsError::FixtureNotFound { body, fixture })?;
        target.ray_cast(input, &owner.transform, child_index)
    }

    // ---- spatial queries ---------------------------------------------------

    /// Bodies owning at least one proxy whose fat bounds overlap `aabb`
    pub fn find_bodies_in_aabb(&self, aabb: &AABB) -> Vec<BodyId> {
        let mut seen = HashSet::new();
        self.broad_phase
            .query(aabb)
            .into_iter()
            .filter_map(|proxy| self.broad_phase.tag(proxy))
            .map(|tag| tag.body)
            .filter(|body| seen.insert(*body))
            .collect()
    }

    /// Union of the fat bounds of every indexed proxy of a body
    pub fn body_fat_aabb(&self, id: BodyId) -> Option<AABB> {
        let body = self.bodies.get(&id)?;
        body.combined_aabb(|proxy| proxy.proxy_id.and_then(|proxy_id| self.broad_phase.fat_aabb(proxy_id)))
    }

    // ---- stepping ----------------------------------------------------------

    /// Create contacts for every new overlap reported by the broad phase
    pub fn find_new_contacts(&mut self) {
        let bodies = &mut self.bodies;
        let contacts = &mut self.contacts;
        self.broad_phase
            .update_pairs(&mut |a, b| contacts.add_pair(a, b, bodies));
    }

    /// Drop flagged contacts the filters no longer admit
    pub fn filter_contacts(&mut self) -> usize {
        self.contacts.filter_contacts(&self.bodies)
    }

    /// Advance awake bodies by their velocities and refresh contacts
    pub fn step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        self.ensure_unlocked()?;
        self.locked = true;

        if self.take_new_fixture_flag() {
            self.find_new_contacts();
        }
        self.filter_contacts();

        for body in self.bodies.values_mut() {
            if !body.enabled || !body.awake || !body.is_moving() {
                continue;
            }
            let next = Transform2::new(
                body.transform.position + body.linear_velocity * dt,
                body.transform.angle() + body.angular_velocity * dt,
            );
            Self::sweep(self.broad_phase.as_mut(), body, next);
        }
        self.find_new_contacts();

        self.locked = false;
        Ok(())
    }

    // ---- migration -------------------------------------------------------

    /// Recreate a body, its fixtures and their proxies inside `other`
    ///
    /// Body and fixture ids are preserved; event subscribers are not.
    pub fn deep_clone_body_into(&self, id: BodyId, other: &mut World) -> Result<(), PhysicsError> {
        let body = self.bodies.get(&id).ok_or(PhysicsError::BodyNotFound(id))?;
        other.ensure_unlocked()?;
        if other.bodies.contains_key(&id) {
            return Err(PhysicsError::DuplicateBody(id));
        }

        let mut copy = body.migration_copy();
        let fixtures = std::mem::take(&mut copy.fixtures);
        other.bodies.insert(id, copy);
        for fixture in fixtures {
            other.register_fixture(id, fixture)?;
        }
        if let Some(inserted) = other.bodies.get_mut(&id) {
            inserted.reset_mass_data();
        }
        Ok(())
    }

    /// Move a body into `other`; afterwards it exists only there
    pub fn transfer_body(&mut self, id: BodyId, other: &mut World) -> Result<(), PhysicsError> {
        self.ensure_unlocked()?;
        self.deep_clone_body_into(id, other)?;
        self.remove_body(id)?;
        log::trace!("moved body {} from '{}' to '{}'", id, self.label, other.label);
        Ok(())
    }
}

/// Mutable view of one fixture inside a [`World`]
///
/// Changing any filter property flags the fixture's contacts for
/// re-filtering and queues its proxies so new pairs can form.
pub struct FixtureMut<'w> {
    body: &'w mut Body,
    index: usize,
    broad_phase: &'w mut dyn BroadPhase,
    contacts: &'w mut ContactManager,
}

impl FixtureMut<'_> {
    /// The fixture
    pub fn fixture(&self) -> &Fixture {
        &self.body.fixtures[self.index]
    }

    fn fixture_mut(&mut self) -> &mut Fixture {
        &mut self.body.fixtures[self.index]
    }

    fn refilter_if(&mut self, changed: bool) {
        if changed {
            self.refilter();
        }
    }

    /// Flag contacts and touch every indexed proxy
    pub fn refilter(&mut self) {
        let fixture = &self.body.fixtures[self.index];
        fixture.refilter(self.contacts, self.broad_phase);
    }

    /// Set the categories this fixture belongs to
    pub fn set_collision_categories(&mut self, categories: Category) -> Result<(), PhysicsError> {
        let changed = self.fixture_mut().filter_mut()?.set_categories(categories);
        self.refilter_if(changed);
        Ok(())
    }

    /// Set the categories this fixture accepts collisions from
    pub fn set_collides_with(&mut self, categories: Category) -> Result<(), PhysicsError> {
        let changed = self.fixture_mut().filter_mut()?.set_collides_with(categories);
        self.refilter_if(changed);
        Ok(())
    }

    /// Set the collision group
    pub fn set_collision_group(&mut self, group: i16) -> Result<(), PhysicsError> {
        let changed = self.fixture_mut().filter_mut()?.set_group(group);
        self.refilter_if(changed);
        Ok(())
    }

    /// Never collide with `other`
    pub fn ignore_collision_with(&mut self, other: FixtureId) -> Result<(), PhysicsError> {
        let changed = self.fixture_mut().filter_mut()?.ignore(other);
        self.refilter_if(changed);
        Ok(())
    }

    /// Undo [`FixtureMut::ignore_collision_with`]
    pub fn restore_collision_with(&mut self, other: FixtureId) -> Result<(), PhysicsError> {
        let changed = self.fixture_mut().filter_mut()?.restore(other);
        self.refilter_if(changed);
        Ok(())
    }

    /// Set the categories excluded from continuous collision
    pub fn set_ignore_ccd_with(&mut self, categories: Category) -> Result<(), PhysicsError> {
        self.fixture_mut().set_ignore_ccd_with(categories)
    }

    /// Toggle sensor mode; always wakes the body
    pub fn set_sensor(&mut self, sensor: bool) -> Result<(), PhysicsError> {
        self.fixture_mut().set_sensor(sensor)?;
        self.body.awake = true;
        Ok(())
    }

    /// Set the friction coefficient
    pub fn set_friction(&mut self, friction: f32) -> Result<(), PhysicsError> {
        self.fixture_mut().set_friction(friction)
    }

    /// Set the restitution
    pub fn set_restitution(&mut self, restitution: f32) -> Result<(), PhysicsError> {
        self.fixture_mut().set_restitution(restitution)
    }

    /// Change the shape density and recompute body mass
    pub fn set_density(&mut self, density: f32) -> Result<(), PhysicsError> {
        self.fixture_mut().set_density(density)?;
        self.body.reset_mass_data();
        Ok(())
    }

    /// Attach or clear the user payload
    pub fn set_tag(&mut self, tag: Option<UserTag>) -> Result<(), PhysicsError> {
        self.fixture_mut().set_tag(tag)
    }

    /// Collision callbacks
    pub fn events_mut(&mut self) -> &mut FixtureEvents {
        self.fixture_mut().events_mut()
    }
}
