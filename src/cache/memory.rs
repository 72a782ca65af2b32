//! Memory Tier Module
//!
//! Bounded in-process front layer over a persistent backend. Holds recently
//! read or written tiles and evicts the least recently used one when full.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::cache::CacheEntry;

// == Memory Tier ==
/// Recently used entries, keyed by cache key.
///
/// Access order lives in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
///
/// A capacity of 0 disables the tier.
#[derive(Debug, Default)]
pub struct MemoryTier {
    capacity: usize,
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
}

impl MemoryTier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    // == Lookup ==
    /// Returns a live entry and marks it most recently used.
    ///
    /// An entry expired at `now` is dropped from memory only; the persistent
    /// record is left for the next sweep.
    pub fn get(&mut self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let expired = self.entries.get(key)?.is_expired_at(now);

        if expired {
            self.remove(key);
            return None;
        }

        self.touch(key);
        self.entries.get(key).cloned()
    }

    // == Insert ==
    /// Stores a copy of `entry`, evicting the oldest entries beyond capacity.
    pub fn insert(&mut self, entry: &CacheEntry) {
        if !self.is_enabled() {
            return;
        }

        self.touch(&entry.key);
        self.entries.insert(entry.key.clone(), entry.clone());

        while self.entries.len() > self.capacity {
            match self.order.pop_back() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    // == Invalidation ==
    pub fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    /// Drops every entry with `expiration <= now`.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves `key` to the front of the access order.
    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_front(key.to_string());
    }
}
