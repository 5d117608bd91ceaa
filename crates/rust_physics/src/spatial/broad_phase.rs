//! Abstract broad-phase interface
//!
//! The broad phase quickly identifies pairs of fixture children that might
//! be touching, and answers "what lies in this box" for the hibernation
//! engine.

use crate::collision::AABB;
use crate::dynamics::{BodyId, FixtureId};
use crate::foundation::collections::new_key_type;
use crate::foundation::math::Vec2;

new_key_type! {
    /// Handle of one proxy inside a broad phase
    pub struct ProxyId;
}

/// What a proxy stands for: one child of one fixture on one body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProxyTag {
    /// Owning body
    pub body: BodyId,
    /// Owning fixture
    pub fixture: FixtureId,
    /// Shape child index
    pub child_index: usize,
}

/// Abstract interface for the spatial index backing every fixture proxy
pub trait BroadPhase: Send + Sync {
    /// Insert a proxy for `aabb`; the stored bounds are fattened
    fn add_proxy(&mut self, aabb: AABB, tag: ProxyTag) -> ProxyId;

    /// Remove a proxy; unknown handles are ignored
    fn remove_proxy(&mut self, proxy: ProxyId);

    /// Report new tight bounds and the displacement that produced them
    ///
    /// Returns `true` when the stored fat bounds had to be recomputed, in
    /// which case the proxy is queued for pair updates.
    fn move_proxy(&mut self, proxy: ProxyId, aabb: AABB, displacement: Vec2) -> bool;

    /// Queue a proxy for pair re-evaluation without moving it
    fn touch_proxy(&mut self, proxy: ProxyId);

    /// Whether the proxy is queued for pair re-evaluation
    fn is_touched(&self, proxy: ProxyId) -> bool;

    /// Stored (fattened) bounds of a proxy
    fn fat_aabb(&self, proxy: ProxyId) -> Option<AABB>;

    /// Tag the proxy was registered with
    fn tag(&self, proxy: ProxyId) -> Option<ProxyTag>;

    /// All proxies whose fat bounds overlap `aabb`
    fn query(&self, aabb: &AABB) -> Vec<ProxyId>;

    /// Report every overlapping pair involving a queued proxy, then clear
    /// the queue
    fn update_pairs(&mut self, callback: &mut dyn FnMut(ProxyTag, ProxyTag));

    /// Number of live proxies
    fn proxy_count(&self) -> usize;
}
