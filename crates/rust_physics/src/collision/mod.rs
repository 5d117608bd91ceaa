//! Collision geometry consumed by fixtures and the broad phase
//!
//! Narrow-phase math is deliberately small here: shapes only need to report
//! bounds per child, answer point and ray queries, and produce mass data.
//!
//! # Module Organization
//!
//! - [`aabb`] - Axis-aligned bounding boxes used by every spatial query
//! - [`ray`] - Ray-cast input and output records
//! - [`shape`] - Circle, polygon and chain shapes

pub mod aabb;
pub mod ray;
pub mod shape;

pub use aabb::AABB;
pub use ray::{RayCastInput, RayCastOutput};
pub use shape::{MassData, Shape, ShapeType};
