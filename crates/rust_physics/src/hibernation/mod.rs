//! Spatial hibernation
//!
//! Bodies far from every active area are moved out of the simulated world
//! into a dormant one, and moved back as soon as an area reaches them.
//!
//! # Module Organization
//!
//! - [`area_body`] - Per-area membership records and their status
//! - [`area`] - Free-floating and body-tracking active areas
//! - [`manager`] - The per-tick update pipeline

pub mod area;
pub mod area_body;
pub mod manager;

#[cfg(test)]
mod tests;

pub use area::{ActiveArea, ActiveAreaKind, AreaId};
pub use area_body::{AreaBody, AreaBodyStatus};
pub use manager::{HibernationError, HibernationManager, HibernationReport};
