//! Linear broad phase
//!
//! Stores fat AABBs in a slot map and answers queries by scanning. Fine for
//! the body counts a hibernating world keeps hot; swap in a tree through the
//! [`BroadPhase`] trait when that stops being true.

use std::collections::HashSet;

use crate::collision::AABB;
use crate::config::BroadPhaseConfig;
use crate::foundation::collections::SlotMap;
use crate::foundation::math::Vec2;
use crate::spatial::broad_phase::{BroadPhase, ProxyId, ProxyTag};

#[derive(Debug, Clone, Copy)]
struct ProxyEntry {
    fat_aabb: AABB,
    tag: ProxyTag,
}

/// Slot-map backed broad phase with fat AABBs and a move buffer
#[derive(Debug, Clone, Default)]
pub struct SimpleBroadPhase {
    proxies: SlotMap<ProxyId, ProxyEntry>,
    move_buffer: Vec<ProxyId>,
    config: BroadPhaseConfig,
}

impl SimpleBroadPhase {
    /// Create an empty broad phase
    pub fn new(config: BroadPhaseConfig) -> Self {
        Self {
            proxies: SlotMap::with_key(),
            move_buffer: Vec::new(),
            config,
        }
    }

    fn fatten(&self, aabb: &AABB) -> AABB {
        aabb.expanded(self.config.aabb_margin)
    }

    fn queue(&mut self, proxy: ProxyId) {
        if !self.move_buffer.contains(&proxy) {
            self.move_buffer.push(proxy);
        }
    }
}

impl BroadPhase for SimpleBroadPhase {
    fn add_proxy(&mut self, aabb: AABB, tag: ProxyTag) -> ProxyId {
        let fat_aabb = self.fatten(&aabb);
        let proxy = self.proxies.insert(ProxyEntry { fat_aabb, tag });
        self.queue(proxy);
        log::trace!("broad phase: added proxy {:?} for {:?}", proxy, tag);
        proxy
    }

    fn remove_proxy(&mut self, proxy: ProxyId) {
        if self.proxies.remove(proxy).is_some() {
            self.move_buffer.retain(|&queued| queued != proxy);
        }
    }

    fn move_proxy(&mut self, proxy: ProxyId, aabb: AABB, displacement: Vec2) -> bool {
        let Some(entry) = self.proxies.get(proxy) else {
            return false;
        };

        let mut fat = self.fatten(&aabb);
        let d = displacement * self.config.aabb_multiplier;
        for axis in 0..2 {
            if d[axis] < 0.0 {
                fat.min[axis] += d[axis];
            } else {
                fat.max[axis] += d[axis];
            }
        }

        let stored = entry.fat_aabb;
        if stored.contains(&aabb) {
            // Still enclosed; only refit if the stored box has grown far
            // larger than the freshly predicted one.
            let huge = fat.expanded(4.0 * self.config.aabb_margin);
            if huge.contains(&stored) {
                return false;
            }
        }

        if let Some(entry) = self.proxies.get_mut(proxy) {
            entry.fat_aabb = fat;
        }
        self.queue(proxy);
        true
    }

    fn touch_proxy(&mut self, proxy: ProxyId) {
        if self.proxies.contains_key(proxy) {
            self.queue(proxy);
        }
    }

    fn is_touched(&self, proxy: ProxyId) -> bool {
        self.move_buffer.contains(&proxy)
    }

    fn fat_aabb(&self, proxy: ProxyId) -> Option<AABB> {
        self.proxies.get(proxy).map(|entry| entry.fat_aabb)
    }

    fn tag(&self, proxy: ProxyId) -> Option<ProxyTag> {
        self.proxies.get(proxy).map(|entry| entry.tag)
    }

    fn query(&self, aabb: &AABB) -> Vec<ProxyId> {
        self.proxies
            .iter()
            .filter(|(_, entry)| entry.fat_aabb.overlaps(aabb))
            .map(|(proxy, _)| proxy)
            .collect()
    }

    fn update_pairs(&mut self, callback: &mut dyn FnMut(ProxyTag, ProxyTag)) {
        let moved = std::mem::take(&mut self.move_buffer);
        let moved_set: HashSet<ProxyId> = moved.iter().copied().collect();
        let mut seen: HashSet<(ProxyId, ProxyId)> = HashSet::new();

        for &query_proxy in &moved {
            let Some(entry) = self.proxies.get(query_proxy) else {
                continue;
            };

            for other in self.query(&entry.fat_aabb) {
                if other == query_proxy {
                    continue;
                }
                // Two moved proxies find each other; report the pair once.
                if moved_set.contains(&other) && other < query_proxy {
                    continue;
                }
                let key = if query_proxy < other { (query_proxy, other) } else { (other, query_proxy) };
                if !seen.insert(key) {
                    continue;
                }
                if let (Some(a), Some(b)) = (self.proxies.get(key.0), self.proxies.get(key.1)) {
                    callback(a.tag, b.tag);
                }
            }
        }
    }

    fn proxy_count(&self) -> usize {
        self.proxies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::{BodyId, FixtureId};

    fn tag(n: u32) -> ProxyTag {
        ProxyTag {
            body: BodyId::from_raw(n),
            fixture: FixtureId::from_raw(n),
            child_index: 0,
        }
    }

    #[test]
    fn test_insert_query_remove() {
        let mut bp = SimpleBroadPhase::new(BroadPhaseConfig::exact());
        let a = bp.add_proxy(AABB::from_coords(0.0, 0.0, 1.0, 1.0), tag(1));
        let b = bp.add_proxy(AABB::from_coords(5.0, 5.0, 6.0, 6.0), tag(2));
        assert_eq!(bp.proxy_count(), 2);

        let hits = bp.query(&AABB::from_coords(-1.0, -1.0, 2.0, 2.0));
        assert_eq!(hits, vec![a]);

        bp.remove_proxy(a);
        assert_eq!(bp.proxy_count(), 1);
        assert!(bp.fat_aabb(a).is_none());
        assert_eq!(bp.tag(b), Some(tag(2)));
    }

    #[test]
    fn test_fat_margin_applied() {
        let mut bp = SimpleBroadPhase::new(BroadPhaseConfig::default());
        let a = bp.add_proxy(AABB::from_coords(0.0, 0.0, 1.0, 1.0), tag(1));
        let fat = bp.fat_aabb(a).unwrap();
        assert!(fat.contains(&AABB::from_coords(-0.09, -0.09, 1.09, 1.09)));
    }

    #[test]
    fn test_small_move_keeps_fat_bounds() {
        let mut bp = SimpleBroadPhase::new(BroadPhaseConfig::default());
        let a = bp.add_proxy(AABB::from_coords(0.0, 0.0, 1.0, 1.0), tag(1));
        bp.update_pairs(&mut |_, _| {});

        let moved = bp.move_proxy(a, AABB::from_coords(0.05, 0.0, 1.05, 1.0), Vec2::new(0.05, 0.0));
        assert!(!moved);
        assert!(!bp.is_touched(a));
    }

    #[test]
    fn test_large_move_predicts_displacement() {
        let mut bp = SimpleBroadPhase::new(BroadPhaseConfig::default());
        let a = bp.add_proxy(AABB::from_coords(0.0, 0.0, 1.0, 1.0), tag(1));

        let moved = bp.move_proxy(a, AABB::from_coords(3.0, 0.0, 4.0, 1.0), Vec2::new(3.0, 0.0));
        assert!(moved);
        let fat = bp.fat_aabb(a).unwrap();
        // margin 0.1, multiplier 2: the box reaches 6 units further along +x.
        assert!((fat.max.x - 10.1).abs() < 1e-5);
        assert!((fat.min.x - 2.9).abs() < 1e-5);
    }

    #[test]
    fn test_shrinking_refits_stale_bounds() {
        let mut bp = SimpleBroadPhase::new(BroadPhaseConfig::exact());
        let a = bp.add_proxy(AABB::from_coords(0.0, 0.0, 10.0, 10.0), tag(1));
        assert!(bp.move_proxy(a, AABB::from_coords(1.0, 1.0, 2.0, 2.0), Vec2::zeros()));
        assert_eq!(bp.fat_aabb(a), Some(AABB::from_coords(1.0, 1.0, 2.0, 2.0)));
    }

    #[test]
    fn test_update_pairs_reports_each_pair_once() {
        let mut bp = SimpleBroadPhase::new(BroadPhaseConfig::exact());
        bp.add_proxy(AABB::from_coords(0.0, 0.0, 2.0, 2.0), tag(1));
        bp.add_proxy(AABB::from_coords(1.0, 1.0, 3.0, 3.0), tag(2));
        bp.add_proxy(AABB::from_coords(9.0, 9.0, 10.0, 10.0), tag(3));

        let mut pairs = Vec::new();
        bp.update_pairs(&mut |a, b| pairs.push((a.body, b.body)));
        assert_eq!(pairs.len(), 1);

        // Queue drained: nothing new to report.
        let mut again = 0;
        bp.update_pairs(&mut |_, _| again += 1);
        assert_eq!(again, 0);
    }

    #[test]
    fn test_touch_requeues_existing_pairs() {
        let mut bp = SimpleBroadPhase::new(BroadPhaseConfig::exact());
        let a = bp.add_proxy(AABB::from_coords(0.0, 0.0, 2.0, 2.0), tag(1));
        bp.add_proxy(AABB::from_coords(1.0, 1.0, 3.0, 3.0), tag(2));
        bp.update_pairs(&mut |_, _| {});

        bp.touch_proxy(a);
        assert!(bp.is_touched(a));
        let mut count = 0;
        bp.update_pairs(&mut |_, _| count += 1);
        assert_eq!(count, 1);
        assert!(!bp.is_touched(a));
    }
}
