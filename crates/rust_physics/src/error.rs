//! Error types for body stores and fixtures

use thiserror::Error;

use crate::collision::shape::ShapeError;
use crate::dynamics::{BodyId, FixtureId};

/// Errors raised by the body store and fixture operations
///
/// Every variant is a precondition the caller violated; none of them leave
/// the store partially modified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// The world is mid-step and cannot be structurally modified
    #[error("world '{0}' is locked")]
    WorldLocked(String),

    /// No body with this id lives in the world
    #[error("body {0} not found")]
    BodyNotFound(BodyId),

    /// A body with this id already lives in the world
    #[error("body {0} already exists in the destination world")]
    DuplicateBody(BodyId),

    /// The body has no fixture with this id
    #[error("fixture {fixture} not found on body {body}")]
    FixtureNotFound {
        /// Body that was searched
        body: BodyId,
        /// Fixture that was requested
        fixture: FixtureId,
    },

    /// The fixture has been destroyed and can no longer be used
    #[error("fixture {0} has been destroyed")]
    FixtureDestroyed(FixtureId),

    /// A fixture was destroyed while still holding indexed proxies
    #[error("fixture {fixture} still has {count} indexed proxies")]
    ProxiesStillIndexed {
        /// Offending fixture
        fixture: FixtureId,
        /// Number of proxies still in the broad phase
        count: usize,
    },

    /// A shape child index past the end of the fixture's proxies
    #[error("child index {index} out of range for fixture {fixture} with {count} children")]
    ChildIndexOutOfRange {
        /// Fixture queried
        fixture: FixtureId,
        /// Requested child
        index: usize,
        /// Number of children
        count: usize,
    },

    /// A material property was assigned NaN
    #[error("{field} must not be NaN")]
    NotANumber {
        /// Property name
        field: &'static str,
    },

    /// Shape construction failed
    #[error(transparent)]
    Shape(#[from] ShapeError),
}
