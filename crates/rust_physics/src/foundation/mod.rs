//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - 2D math types and rigid transforms
//! - Stable identifiers and slot-map handles
//! - Time sources for ageing tracking regions
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
