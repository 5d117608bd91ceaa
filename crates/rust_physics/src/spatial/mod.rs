//! Spatial indexing for fixture proxies
//!
//! Every fixture child is registered as one AABB proxy. Body stores talk to
//! the index only through the [`BroadPhase`] trait, so the indexing scheme
//! can be swapped without touching fixtures or the hibernation engine.

mod broad_phase;
mod simple_broad_phase;

pub use broad_phase::{BroadPhase, ProxyId, ProxyTag};
pub use simple_broad_phase::SimpleBroadPhase;
