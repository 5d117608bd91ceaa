//! Bodies, fixtures and the body store that owns them
//!
//! # Module Organization
//!
//! - [`filter`] - Category masks, collision groups and per-fixture ignores
//! - [`fixture`] - Shape attachments and their broad-phase proxies
//! - [`events`] - Per-fixture collision callbacks
//! - [`body`] - Rigid bodies and their identities
//! - [`contact`] - Candidate contact bookkeeping
//! - [`world`] - The body store

pub mod body;
pub mod contact;
pub mod events;
pub mod filter;
pub mod fixture;
pub mod tag;
pub mod world;

pub use body::{Body, BodyDef, BodyId};
pub use contact::{Contact, ContactManager};
pub use events::{ContactImpulse, FixtureEvents};
pub use filter::{Category, CollisionFilter};
pub use fixture::{Fixture, FixtureId, FixtureProxy, FixtureState};
pub use tag::UserTag;
pub use world::{FixtureMut, World};
