//! Per-fixture collision callbacks

use std::fmt;

use crate::dynamics::fixture::FixtureId;

/// Impulses applied while resolving one contact
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactImpulse {
    /// Normal impulse per manifold point
    pub normal_impulses: [f32; 2],
    /// Tangent impulse per manifold point
    pub tangent_impulses: [f32; 2],
    /// Number of valid manifold points
    pub point_count: usize,
}

/// Veto hook run before a contact is created; `false` rejects the pair
pub type BeforeCollisionHandler = Box<dyn FnMut(FixtureId, FixtureId) -> bool + Send>;
/// Run when two fixtures start touching; `false` disables the contact
pub type CollisionHandler = Box<dyn FnMut(FixtureId, FixtureId) -> bool + Send>;
/// Run when two fixtures stop touching
pub type SeparationHandler = Box<dyn FnMut(FixtureId, FixtureId) + Send>;
/// Run after the solver with the impulses it applied
pub type AfterCollisionHandler = Box<dyn FnMut(FixtureId, FixtureId, &ContactImpulse) + Send>;

/// Subscriber lists for one fixture
///
/// Handlers receive the owning fixture first and the other fixture second.
/// Migration between worlds never carries handlers across.
#[derive(Default)]
pub struct FixtureEvents {
    before_collision: Vec<BeforeCollisionHandler>,
    on_collision: Vec<CollisionHandler>,
    on_separation: Vec<SeparationHandler>,
    after_collision: Vec<AfterCollisionHandler>,
}

impl fmt::Debug for FixtureEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureEvents")
            .field("before_collision", &self.before_collision.len())
            .field("on_collision", &self.on_collision.len())
            .field("on_separation", &self.on_separation.len())
            .field("after_collision", &self.after_collision.len())
            .finish()
    }
}

impl FixtureEvents {
    /// Subscribe a pre-contact veto
    pub fn on_before_collision(&mut self, handler: impl FnMut(FixtureId, FixtureId) -> bool + Send + 'static) {
        self.before_collision.push(Box::new(handler));
    }

    /// Subscribe to touch begin
    pub fn on_collision(&mut self, handler: impl FnMut(FixtureId, FixtureId) -> bool + Send + 'static) {
        self.on_collision.push(Box::new(handler));
    }

    /// Subscribe to touch end
    pub fn on_separation(&mut self, handler: impl FnMut(FixtureId, FixtureId) + Send + 'static) {
        self.on_separation.push(Box::new(handler));
    }

    /// Subscribe to post-solve
    pub fn on_after_collision(
        &mut self,
        handler: impl FnMut(FixtureId, FixtureId, &ContactImpulse) + Send + 'static,
    ) {
        self.after_collision.push(Box::new(handler));
    }

    /// Every veto handler runs; the pair survives only if all accept
    pub fn fire_before_collision(&mut self, own: FixtureId, other: FixtureId) -> bool {
        self.before_collision
            .iter_mut()
            .fold(true, |accepted, handler| handler(own, other) && accepted)
    }

    /// Every handler runs; the contact stays enabled only if all accept
    pub fn fire_collision(&mut self, own: FixtureId, other: FixtureId) -> bool {
        self.on_collision
            .iter_mut()
            .fold(true, |enabled, handler| handler(own, other) && enabled)
    }

    /// Notify separation subscribers
    pub fn fire_separation(&mut self, own: FixtureId, other: FixtureId) {
        for handler in &mut self.on_separation {
            handler(own, other);
        }
    }

    /// Notify post-solve subscribers
    pub fn fire_after_collision(&mut self, own: FixtureId, other: FixtureId, impulse: &ContactImpulse) {
        for handler in &mut self.after_collision {
            handler(own, other, impulse);
        }
    }

    /// Total number of subscribed handlers
    pub fn subscriber_count(&self) -> usize {
        self.before_collision.len() + self.on_collision.len() + self.on_separation.len() + self.after_collision.len()
    }

    /// Drop every handler
    pub fn clear(&mut self) {
        self.before_collision.clear();
        self.on_collision.clear();
        self.on_separation.clear();
        self.after_collision.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_veto_runs_every_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut events = FixtureEvents::default();
        let c1 = Arc::clone(&calls);
        events.on_before_collision(move |_, _| {
            c1.fetch_add(1, Ordering::SeqCst);
            false
        });
        let c2 = Arc::clone(&calls);
        events.on_before_collision(move |_, _| {
            c2.fetch_add(1, Ordering::SeqCst);
            true
        });

        let accepted = events.fire_before_collision(FixtureId::from_raw(1), FixtureId::from_raw(2));
        assert!(!accepted);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_drops_handlers() {
        let mut events = FixtureEvents::default();
        events.on_separation(|_, _| {});
        events.on_after_collision(|_, _, _| {});
        assert_eq!(events.subscriber_count(), 2);
        events.clear();
        assert_eq!(events.subscriber_count(), 0);
        assert!(events.fire_collision(FixtureId::from_raw(1), FixtureId::from_raw(2)));
    }
}
