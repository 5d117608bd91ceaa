//! Candidate contacts produced by the broad phase
//!
//! Only the bookkeeping the fixture filter relies on lives here: pairs are
//! created from broad-phase overlaps, flagged when a fixture's filter
//! changes, and dropped when the filter no longer admits them.

use std::collections::BTreeMap;

use crate::dynamics::body::{Body, BodyId};
use crate::dynamics::filter::CollisionFilter;
use crate::dynamics::fixture::{Fixture, FixtureId};
use crate::spatial::ProxyTag;

/// A pair of fixture children whose fat bounds overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// First participant
    pub a: ProxyTag,
    /// Second participant
    pub b: ProxyTag,
    /// Set when either fixture's filter changed since the last filtering
    pub needs_filtering: bool,
}

impl Contact {
    /// Whether the contact involves `fixture`
    pub fn involves(&self, fixture: FixtureId) -> bool {
        self.a.fixture == fixture || self.b.fixture == fixture
    }

    /// Whether the contact involves `body`
    pub fn involves_body(&self, body: BodyId) -> bool {
        self.a.body == body || self.b.body == body
    }

    fn matches(&self, a: &ProxyTag, b: &ProxyTag) -> bool {
        let same = |x: &ProxyTag, y: &ProxyTag| x.fixture == y.fixture && x.child_index == y.child_index;
        (same(&self.a, a) && same(&self.b, b)) || (same(&self.a, b) && same(&self.b, a))
    }
}

/// Owns every candidate contact of one world
#[derive(Debug, Default)]
pub struct ContactManager {
    contacts: Vec<Contact>,
}

fn lookup(bodies: &BTreeMap<BodyId, Body>, tag: &ProxyTag) -> Option<usize> {
    bodies.get(&tag.body).and_then(|body| body.fixture_index(tag.fixture))
}

fn fixture_at<'a>(bodies: &'a BTreeMap<BodyId, Body>, tag: &ProxyTag, index: usize) -> Option<&'a Fixture> {
    bodies.get(&tag.body).and_then(|body| body.fixtures.get(index))
}

fn admits(bodies: &BTreeMap<BodyId, Body>, a: &ProxyTag, b: &ProxyTag) -> bool {
    let (Some(ia), Some(ib)) = (lookup(bodies, a), lookup(bodies, b)) else {
        return false;
    };
    let (Some(fa), Some(fb)) = (fixture_at(bodies, a, ia), fixture_at(bodies, b, ib)) else {
        return false;
    };
    CollisionFilter::should_collide(fa.id(), fa.filter(), fb.id(), fb.filter())
}

impl ContactManager {
    /// Every live contact
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of live contacts
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether there are no contacts
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contacts involving `fixture`
    pub fn involving(&self, fixture: FixtureId) -> impl Iterator<Item = &Contact> + '_ {
        self.contacts.iter().filter(move |contact| contact.involves(fixture))
    }

    /// Broad-phase callback: create a contact if the pair is admitted
    pub(crate) fn add_pair(&mut self, a: ProxyTag, b: ProxyTag, bodies: &mut BTreeMap<BodyId, Body>) {
        if a.body == b.body {
            return;
        }
        if self.contacts.iter().any(|contact| contact.matches(&a, &b)) {
            return;
        }
        if !admits(bodies, &a, &b) {
            return;
        }

        for (own, other) in [(a, b), (b, a)] {
            let Some(index) = lookup(bodies, &own) else {
                return;
            };
            let Some(fixture) = bodies.get_mut(&own.body).and_then(|body| body.fixtures.get_mut(index)) else {
                return;
            };
            if !fixture.events_mut().fire_before_collision(own.fixture, other.fixture) {
                return;
            }
        }

        log::trace!("contact created between {} and {}", a.fixture, b.fixture);
        self.contacts.push(Contact {
            a,
            b,
            needs_filtering: false,
        });
    }

    /// Mark every contact involving `fixture` for re-filtering
    pub(crate) fn flag_for_filtering(&mut self, fixture: FixtureId) {
        for contact in self.contacts.iter_mut().filter(|contact| contact.involves(fixture)) {
            contact.needs_filtering = true;
        }
    }

    /// Drop flagged contacts the filters no longer admit; returns how many
    pub(crate) fn filter_contacts(&mut self, bodies: &BTreeMap<BodyId, Body>) -> usize {
        let before = self.contacts.len();
        self.contacts
            .retain(|contact| !contact.needs_filtering || admits(bodies, &contact.a, &contact.b));
        for contact in &mut self.contacts {
            contact.needs_filtering = false;
        }
        before - self.contacts.len()
    }

    pub(crate) fn destroy_for_body(&mut self, body: BodyId) {
        self.contacts.retain(|contact| !contact.involves_body(body));
    }

    pub(crate) fn destroy_for_fixture(&mut self, fixture: FixtureId) {
        self.contacts.retain(|contact| !contact.involves(fixture));
    }
}
