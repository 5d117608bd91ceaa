//! Collision filtering
//!
//! Two fixtures are candidates for a contact only when their category
//! masks accept each other, their collision group does not forbid it, and
//! neither has explicitly ignored the other.

use std::collections::HashSet;

use bitflags::bitflags;

use crate::dynamics::fixture::FixtureId;

bitflags! {
    /// 32-bit collision category mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Category: u32 {
        const CAT1 = 1 << 0;
        const CAT2 = 1 << 1;
        const CAT3 = 1 << 2;
        const CAT4 = 1 << 3;
        const CAT5 = 1 << 4;
        const CAT6 = 1 << 5;
        const CAT7 = 1 << 6;
        const CAT8 = 1 << 7;
        const CAT9 = 1 << 8;
        const CAT10 = 1 << 9;
        const CAT11 = 1 << 10;
        const CAT12 = 1 << 11;
        const CAT13 = 1 << 12;
        const CAT14 = 1 << 13;
        const CAT15 = 1 << 14;
        const CAT16 = 1 << 15;
        const CAT17 = 1 << 16;
        const CAT18 = 1 << 17;
        const CAT19 = 1 << 18;
        const CAT20 = 1 << 19;
        const CAT21 = 1 << 20;
        const CAT22 = 1 << 21;
        const CAT23 = 1 << 22;
        const CAT24 = 1 << 23;
        const CAT25 = 1 << 24;
        const CAT26 = 1 << 25;
        const CAT27 = 1 << 26;
        const CAT28 = 1 << 27;
        const CAT29 = 1 << 28;
        const CAT30 = 1 << 29;
        const CAT31 = 1 << 30;
        const ALL = u32::MAX;
    }
}

impl Category {
    /// No categories
    pub const NONE: Self = Self::empty();
}

/// Filter state carried by every fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionFilter {
    categories: Category,
    collides_with: Category,
    group: i16,
    ignored: HashSet<FixtureId>,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::new(Category::CAT1, Category::ALL)
    }
}

impl CollisionFilter {
    /// Filter with the given masks, group zero and no ignores
    pub fn new(categories: Category, collides_with: Category) -> Self {
        Self {
            categories,
            collides_with,
            group: 0,
            ignored: HashSet::new(),
        }
    }

    /// Categories this fixture belongs to
    pub fn categories(&self) -> Category {
        self.categories
    }

    /// Categories this fixture accepts collisions from
    pub fn collides_with(&self) -> Category {
        self.collides_with
    }

    /// Collision group; positive always collides, negative never
    pub fn group(&self) -> i16 {
        self.group
    }

    /// Fixtures explicitly excluded from collision
    pub fn ignored(&self) -> impl Iterator<Item = FixtureId> + '_ {
        self.ignored.iter().copied()
    }

    /// Returns whether the stored value changed
    pub fn set_categories(&mut self, categories: Category) -> bool {
        replace_if_different(&mut self.categories, categories)
    }

    /// Returns whether the stored value changed
    pub fn set_collides_with(&mut self, collides_with: Category) -> bool {
        replace_if_different(&mut self.collides_with, collides_with)
    }

    /// Returns whether the stored value changed
    pub fn set_group(&mut self, group: i16) -> bool {
        replace_if_different(&mut self.group, group)
    }

    /// Exclude another fixture; returns whether it was newly added
    pub fn ignore(&mut self, fixture: FixtureId) -> bool {
        self.ignored.insert(fixture)
    }

    /// Re-admit a previously ignored fixture; returns whether it was present
    pub fn restore(&mut self, fixture: FixtureId) -> bool {
        self.ignored.remove(&fixture)
    }

    /// Whether `fixture` is in the ignore set
    pub fn is_ignored(&self, fixture: FixtureId) -> bool {
        self.ignored.contains(&fixture)
    }

    /// Decide whether two filtered fixtures may form a contact
    pub fn should_collide(a_id: FixtureId, a: &Self, b_id: FixtureId, b: &Self) -> bool {
        if a.is_ignored(b_id) || b.is_ignored(a_id) {
            return false;
        }
        if a.group == b.group && a.group != 0 {
            return a.group > 0;
        }
        a.collides_with.intersects(b.categories) && b.collides_with.intersects(a.categories)
    }
}

fn replace_if_different<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (FixtureId, FixtureId) {
        (FixtureId::from_raw(10), FixtureId::from_raw(11))
    }

    #[test]
    fn test_defaults_collide() {
        let (a, b) = ids();
        let filter = CollisionFilter::default();
        assert!(CollisionFilter::should_collide(a, &filter, b, &filter));
    }

    #[test]
    fn test_category_masks() {
        let (a, b) = ids();
        let fa = CollisionFilter::new(Category::CAT1, Category::CAT2);
        let fb = CollisionFilter::new(Category::CAT2, Category::CAT1);
        let fc = CollisionFilter::new(Category::CAT3, Category::ALL);
        assert!(CollisionFilter::should_collide(a, &fa, b, &fb));
        assert!(!CollisionFilter::should_collide(a, &fa, b, &fc));
    }

    #[test]
    fn test_group_overrides_masks() {
        let (a, b) = ids();
        let mut fa = CollisionFilter::new(Category::CAT1, Category::NONE);
        let mut fb = fa.clone();
        fa.set_group(3);
        fb.set_group(3);
        assert!(CollisionFilter::should_collide(a, &fa, b, &fb));

        fa.set_group(-3);
        fb.set_group(-3);
        fa.set_collides_with(Category::ALL);
        fb.set_collides_with(Category::ALL);
        assert!(!CollisionFilter::should_collide(a, &fa, b, &fb));
    }

    #[test]
    fn test_ignore_and_restore() {
        let (a, b) = ids();
        let mut fa = CollisionFilter::default();
        let fb = CollisionFilter::default();

        assert!(fa.ignore(b));
        assert!(!fa.ignore(b));
        assert!(fa.is_ignored(b));
        assert!(!CollisionFilter::should_collide(a, &fa, b, &fb));
        assert!(!CollisionFilter::should_collide(b, &fb, a, &fa));

        assert!(fa.restore(b));
        assert!(!fa.restore(b));
        assert!(CollisionFilter::should_collide(a, &fa, b, &fb));
    }

    #[test]
    fn test_setters_report_change() {
        let mut filter = CollisionFilter::default();
        assert!(!filter.set_categories(Category::CAT1));
        assert!(filter.set_categories(Category::CAT1 | Category::CAT5));
        assert!(!filter.set_group(0));
        assert!(filter.set_group(-1));
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let mut a = CollisionFilter::default();
        let mut b = CollisionFilter::default();
        a.ignore(FixtureId::from_raw(1));
        a.ignore(FixtureId::from_raw(2));
        b.ignore(FixtureId::from_raw(2));
        b.ignore(FixtureId::from_raw(1));
        assert_eq!(a, b);
    }
}
