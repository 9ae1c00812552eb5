// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ordered index keyed by a 256-bit value, most significant byte first.
//!
//! Enumeration order depends only on the keys, never on insertion order.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

pub type RadixKey = [u8; 32];

pub trait RadixLeaf {
    fn radix_key(&self) -> RadixKey;
}

#[derive(Debug)]
pub struct RadixTree<T: RadixLeaf> {
    leaves: BTreeMap<RadixKey, Arc<T>>,
}

impl<T: RadixLeaf> Default for RadixTree<T> {
    fn default() -> Self {
        Self { leaves: BTreeMap::new() }
    }
}

impl<T: RadixLeaf> Clone for RadixTree<T> {
    fn clone(&self) -> Self {
        Self { leaves: self.leaves.clone() }
    }
}

impl<T: RadixLeaf> RadixTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a leaf with the same key is already present.
    pub fn insert(&mut self, leaf: Arc<T>) -> bool {
        let key = leaf.radix_key();
        if self.leaves.contains_key(&key) {
            return false;
        }
        self.leaves.insert(key, leaf);
        true
    }

    pub fn remove(&mut self, key: &RadixKey) -> Option<Arc<T>> {
        self.leaves.remove(key)
    }

    pub fn get(&self, key: &RadixKey) -> Option<Arc<T>> {
        self.leaves.get(key).cloned()
    }

    pub fn contains(&self, key: &RadixKey) -> bool {
        self.leaves.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Visits leaves in ascending key order until `f` returns false.
    /// Returns whether every leaf was visited.
    pub fn for_each_leaf(&self, mut f: impl FnMut(&Arc<T>) -> bool) -> bool {
        self.leaves.values().all(|leaf| f(leaf))
    }

    /// Visits, in order, the leaves whose key starts with `prefix`.
    pub fn for_each_with_prefix(&self, prefix: &[u8], mut f: impl FnMut(&Arc<T>) -> bool) -> bool {
        if prefix.len() > 32 {
            return true;
        }
        let mut low = [0u8; 32];
        low[..prefix.len()].copy_from_slice(prefix);
        let mut high = [0xffu8; 32];
        high[..prefix.len()].copy_from_slice(prefix);
        self.leaves
            .range((Bound::Included(low), Bound::Included(high)))
            .all(|(_, leaf)| f(leaf))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.leaves.values()
    }
}
