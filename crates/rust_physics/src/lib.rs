//! # Rust Physics
//!
//! Broad-phase fixture proxies and spatial hibernation for a 2D rigid-body
//! simulator.
//!
//! ## Features
//!
//! - **Fixtures**: Shapes attached to bodies with category, group and
//!   per-fixture ignore filtering
//! - **Broad Phase**: Fat-AABB proxies per shape child behind a swappable trait
//! - **Hibernation**: Bodies away from every active area move into a dormant
//!   world and come back when an area reaches them
//! - **Configuration**: TOML and RON settings files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_physics::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut world = World::new("active", PhysicsConfig::default());
//!     let body = world.create_body(BodyDef::at(Vec2::new(5.0, 5.0)))?;
//!     world.create_fixture(body, Shape::circle(0.5, Vec2::zeros(), 1.0)?)?;
//!
//!     let mut hibernation = HibernationManager::new(&world);
//!     hibernation.add_area(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
//!
//!     world.step(1.0 / 60.0)?;
//!     let report = hibernation.update(&mut world)?;
//!     log::info!("{} bodies hibernated", report.hibernated.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod collision;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod foundation;
pub mod hibernation;
pub mod spatial;

pub use error::PhysicsError;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        collision::{RayCastInput, RayCastOutput, Shape, AABB},
        config::{Config, PhysicsConfig},
        dynamics::{BodyDef, BodyId, Category, Fixture, FixtureId, World},
        error::PhysicsError,
        foundation::{
            math::{Transform2, Vec2},
            time::{Clock, ManualClock, SystemClock},
        },
        hibernation::{AreaId, HibernationError, HibernationManager, HibernationReport},
    };
}
