//! Version-stamped caches
//!
//! Entries carry the resolver version they were computed at. A lookup with
//! a different version is a miss, so bumping the version invalidates every
//! entry without touching them.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// Map of values stamped with the version they were computed at
#[derive(Debug)]
pub struct VersionedCache<K: Eq + Hash, V> {
    entries: DashMap<K, (u64, V)>,
}

impl<K: Eq + Hash, V: Clone> VersionedCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Value for `key` if it was computed at `version`
    pub fn get(&self, key: &K, version: u64) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.0 == version)
            .map(|entry| entry.1.clone())
    }

    /// Store `value`; an entry stamped with a newer version is kept
    pub fn insert(&self, key: K, version: u64, value: V) {
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().0 <= version {
                    occupied.insert((version, value));
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert((version, value));
            }
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> Default for VersionedCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A single version-stamped value
#[derive(Debug)]
pub struct VersionedCell<V> {
    slot: RwLock<Option<(u64, V)>>,
}

impl<V: Clone> VersionedCell<V> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn get(&self, version: u64) -> Option<V> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|(stamp, _)| *stamp == version)
            .map(|(_, value)| value.clone())
    }

    pub fn set(&self, version: u64, value: V) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_none_or(|(stamp, _)| *stamp <= version) {
            *slot = Some((version, value));
        }
    }

    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<V: Clone> Default for VersionedCell<V> {
    fn default() -> Self {
        Self::new()
    }
}
