//! Rigid bodies

use std::fmt;

use crate::collision::{MassData, AABB};
use crate::dynamics::fixture::{Fixture, FixtureId, FixtureProxy};
use crate::dynamics::tag::UserTag;
use crate::foundation::collections::IdAllocator;
use crate::foundation::math::{Transform2, Vec2};

static BODY_IDS: IdAllocator = IdAllocator::new(1);

/// Process-unique body identity, preserved when a body migrates between
/// worlds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u32);

impl BodyId {
    pub(crate) fn next() -> Self {
        Self(BODY_IDS.allocate())
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

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Construction parameters for a body
#[derive(Debug, Clone)]
pub struct BodyDef {
    /// Initial pose
    pub transform: Transform2,
    /// Initial linear velocity
    pub linear_velocity: Vec2,
    /// Initial angular velocity in radians per second
    pub angular_velocity: f32,
    /// Disabled bodies keep their fixtures out of the broad phase
    pub enabled: bool,
    /// Sleep flag
    pub awake: bool,
    /// User payload
    pub tag: Option<UserTag>,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            transform: Transform2::identity(),
            linear_velocity: Vec2::zeros(),
            angular_velocity: 0.0,
            enabled: true,
            awake: true,
            tag: None,
        }
    }
}

impl BodyDef {
    /// Body at `position` with no rotation
    pub fn at(position: Vec2) -> Self {
        Self {
            transform: Transform2::from_position(position),
            ..Self::default()
        }
    }

    /// Set the initial linear velocity
    pub fn with_linear_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Set the initial angular velocity
    pub fn with_angular_velocity(mut self, velocity: f32) -> Self {
        self.angular_velocity = velocity;
        self
    }

    /// Set whether the body starts enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A rigid body and the fixtures attached to it
#[derive(Debug)]
pub struct Body {
    pub(crate) id: BodyId,
    pub(crate) transform: Transform2,
    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f32,
    pub(crate) enabled: bool,
    pub(crate) awake: bool,
    pub(crate) tag: Option<UserTag>,
    pub(crate) fixtures: Vec<Fixture>,
    pub(crate) mass: MassData,
}

impl Body {
    pub(crate) fn from_def(id: BodyId, def: BodyDef) -> Self {
        Self {
            id,
            transform: def.transform,
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            enabled: def.enabled,
            awake: def.awake,
            tag: def.tag,
            fixtures: Vec::new(),
            mass: MassData::default(),
        }
    }

    /// Unique id
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Current pose
    pub fn transform(&self) -> &Transform2 {
        &self.transform
    }

    /// World-space origin
    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Rotation in radians
    pub fn angle(&self) -> f32 {
        self.transform.angle()
    }

    /// Linear velocity
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    /// Angular velocity in radians per second
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Whether any velocity component is non-zero
    pub fn is_moving(&self) -> bool {
        self.angular_velocity != 0.0 || self.linear_velocity.norm() > 0.0
    }

    /// Whether the fixtures take part in the broad phase
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sleep flag
    pub fn is_awake(&self) -> bool {
        self.awake
    }

    /// User payload
    pub fn tag(&self) -> Option<&UserTag> {
        self.tag.as_ref()
    }

    /// Attached fixtures in creation order
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Attached fixture by id
    pub fn fixture(&self, id: FixtureId) -> Option<&Fixture> {
        self.fixtures.iter().find(|fixture| fixture.id() == id)
    }

    pub(crate) fn fixture_index(&self, id: FixtureId) -> Option<usize> {
        self.fixtures.iter().position(|fixture| fixture.id() == id)
    }

    /// Aggregate mass properties of every fixture with positive density
    pub fn mass_data(&self) -> MassData {
        self.mass
    }

    /// Recompute [`Body::mass_data`] from the attached fixtures
    pub(crate) fn reset_mass_data(&mut self) {
        let mut total = MassData::default();
        let mut weighted_center = Vec2::zeros();
        for shape in self.fixtures.iter().filter_map(Fixture::shape) {
            if shape.density <= 0.0 {
                continue;
            }
            let data = shape.compute_mass();
            total.mass += data.mass;
            weighted_center += data.center * data.mass;
            total.inertia += data.inertia;
        }
        if total.mass > 0.0 {
            total.center = weighted_center / total.mass;
        }
        self.mass = total;
    }

    /// Union of the stored broad-phase bounds of every proxy
    ///
    /// `fat` resolves each proxy to the bounds held by the index.
    pub(crate) fn combined_aabb(&self, fat: impl Fn(&FixtureProxy) -> Option<AABB>) -> Option<AABB> {
        self.fixtures
            .iter()
            .flat_map(Fixture::proxies)
            .filter_map(fat)
            .reduce(|acc, aabb| acc.combine(&aabb))
    }

    /// Copy with the same id and fixture ids, not attached to any world
    pub(crate) fn migration_copy(&self) -> Self {
        Self {
            id: self.id,
            transform: self.transform,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            enabled: self.enabled,
            awake: self.awake,
            tag: self.tag.clone(),
            fixtures: self.fixtures.iter().map(Fixture::migration_copy).collect(),
            mass: self.mass,
        }
    }
}
