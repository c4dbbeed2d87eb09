// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Engine caches
//!
//! `BoundedCache` backs the class-regex, token and compiled-selector caches.
//! `ScanState` is the side table for per-node memoized matching results; each
//! entry is stamped with the scan generation that produced it and is ignored
//! by any other generation.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::dom::NodeId;

/// String-keyed cache that evicts the oldest insertion when full
#[derive(Debug)]
pub struct BoundedCache<V> {
    capacity: usize,
    entries: HashMap<String, V>,
    order: VecDeque<String>,
}

impl<V: Clone> BoundedCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).cloned()
    }

    /// Insert a value; returns the evicted key, if any
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<String> {
        let key = key.into();
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return None;
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, value);

        if self.order.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            self.entries.remove(&oldest);
            return Some(oldest);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Identifies one sibling ordering of a parent's children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct OrdinalKey {
    pub parent: NodeId,
    /// Count from the first child instead of the last
    pub forward: bool,
    /// Count only elements with this name (`*-of-type`)
    pub of_type: Option<String>,
}

#[derive(Debug)]
struct OrdinalSlot {
    generation: u64,
    ordinals: HashMap<NodeId, usize>,
}

/// Scan generations and memoized per-node results
#[derive(Debug, Default)]
pub struct ScanState {
    generation: AtomicU64,
    steps: AtomicUsize,
    depth: AtomicUsize,
    combinators: DashMap<(NodeId, usize), (u64, bool)>,
    ordinals: DashMap<OrdinalKey, OrdinalSlot>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generation no earlier execution has used
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Unique id for one combinator step of a compiled matcher
    pub fn next_step(&self) -> usize {
        self.steps.fetch_add(1, Ordering::Relaxed)
    }

    /// Mark the start of an execution. Slots left by earlier top-level
    /// executions are dropped when no other execution is in flight.
    pub fn enter(&self) -> ScanGuard<'_> {
        if self.depth.fetch_add(1, Ordering::AcqRel) == 0 {
            self.clear();
        }
        ScanGuard { state: self }
    }

    pub fn combinator_result(&self, node: NodeId, step: usize, generation: u64) -> Option<bool> {
        self.combinators
            .get(&(node, step))
            .and_then(|slot| (slot.0 == generation).then_some(slot.1))
    }

    pub fn store_combinator_result(&self, node: NodeId, step: usize, generation: u64, value: bool) {
        self.combinators.insert((node, step), (generation, value));
    }

    /// Ordinal of `child` under `key`, computing the whole sibling table on a
    /// miss
    pub(crate) fn ordinal(
        &self,
        key: OrdinalKey,
        child: NodeId,
        generation: u64,
        compute: impl FnOnce() -> HashMap<NodeId, usize>,
    ) -> Option<usize> {
        if let Some(slot) = self.ordinals.get(&key) {
            if slot.generation == generation {
                return slot.ordinals.get(&child).copied();
            }
        }

        let ordinals = compute();
        let found = ordinals.get(&child).copied();
        self.ordinals.insert(
            key,
            OrdinalSlot {
                generation,
                ordinals,
            },
        );
        found
    }

    /// Number of live memo slots
    pub fn slots(&self) -> usize {
        self.combinators.len() + self.ordinals.len()
    }

    pub fn clear(&self) {
        self.combinators.clear();
        self.ordinals.clear();
    }
}

/// Keeps the execution depth counter balanced
pub struct ScanGuard<'a> {
    state: &'a ScanState,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.state.depth.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_cache_evicts_oldest() {
        let mut cache = BoundedCache::new(2);
        assert_eq!(cache.insert("a", 1), None);
        assert_eq!(cache.insert("b", 2), None);
        assert_eq!(cache.insert("a", 10), None);
        assert_eq!(cache.insert("c", 3), Some("a".to_string()));

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_combinator_slots_are_generation_scoped() {
        let state = ScanState::new();
        let node = NodeId::new();
        let g1 = state.next_generation();
        let g2 = state.next_generation();
        assert!(g2 > g1);

        state.store_combinator_result(node, 7, g1, true);
        assert_eq!(state.combinator_result(node, 7, g1), Some(true));
        assert_eq!(state.combinator_result(node, 7, g2), None);
        assert_eq!(state.combinator_result(node, 8, g1), None);
    }

    #[test]
    fn test_ordinal_table_recomputed_per_generation() {
        let state = ScanState::new();
        let parent = NodeId::new();
        let child = NodeId::new();
        let key = OrdinalKey {
            parent,
            forward: true,
            of_type: None,
        };
        let mut computed = 0;

        let g1 = state.next_generation();
        for _ in 0..3 {
            let found = state.ordinal(key.clone(), child, g1, || {
                computed += 1;
                HashMap::from([(child, 4)])
            });
            assert_eq!(found, Some(4));
        }
        assert_eq!(computed, 1);

        let g2 = state.next_generation();
        state.ordinal(key, child, g2, || {
            computed += 1;
            HashMap::from([(child, 5)])
        });
        assert_eq!(computed, 2);
    }

    #[test]
    fn test_top_level_enter_prunes_slots() {
        let state = ScanState::new();
        let g = state.next_generation();
        state.store_combinator_result(NodeId::new(), 1, g, false);

        {
            let _outer = state.enter();
            assert_eq!(state.slots(), 0);
            state.store_combinator_result(NodeId::new(), 1, g, true);
            let _nested = state.enter();
            assert_eq!(state.slots(), 1);
        }

        let _next = state.enter();
        assert_eq!(state.slots(), 0);
    }
}
