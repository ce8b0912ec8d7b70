//! Cache Tools
//!
//! Process-wide fetch state: the page cache keyed by [`CacheKey`], the set
//! of test identities that already fetched, and each identity's fetch history.


use crate::types::CacheKey;
use dashmap::{DashMap, DashSet};
use std::sync::{Arc, Mutex, PoisonError};

/// Outcome of [`FetchCache::get_or_try_insert_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<V> {
    /// Entry was already present; nothing was fetched.
    Hit(V),
    /// Entry was missing, fetched and stored.
    Stored(V),
}

impl<V> CacheLookup<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn into_inner(self) -> V {
        match self {
            Self::Hit(v) | Self::Stored(v) => v,
        }
    }
}

/// Concurrent cache of fetched pages. Entries are never replaced or evicted.
#[derive(Debug)]
pub struct FetchCache<V> {
    entries: DashMap<CacheKey, V>,
    key_locks: DashMap<CacheKey, Arc<Mutex<()>>>,
}

impl<V: Clone> FetchCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            key_locks: DashMap::new(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `value` unless `key` already has an entry. Returns the stored entry.
    pub fn insert(&self, key: CacheKey, value: V) -> V {
        self.entries.entry(key).or_insert(value).value().clone()
    }

    /// Return the entry for `key`, or run `fetch` and store its result.
    ///
    /// Callers for the same key are serialized, so `fetch` runs at most once
    /// per key while it keeps succeeding. Other keys are not blocked. A
    /// failed `fetch` stores nothing.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &CacheKey,
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<CacheLookup<V>, E> {
        let lock = Arc::clone(&self.key_locks.entry(key.clone()).or_default());
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(hit) = self.get(key) {
            return Ok(CacheLookup::Hit(hit));
        }
        let value = fetch()?;
        Ok(CacheLookup::Stored(self.insert(key.clone(), value)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for FetchCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Test identities that have claimed their first fetch this run.
#[derive(Debug, Default)]
pub struct ExecutionTracker {
    seen: DashSet<String>,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, identity: &str) -> bool {
        self.seen.contains(identity)
    }

    /// Atomically mark `identity` as seen. Returns `true` for exactly one
    /// caller per identity, the one whose fetch counts as the first.
    pub fn claim(&self, identity: &str) -> bool {
        self.seen.insert(identity.to_string())
    }

    /// Undo a [`claim`](Self::claim) whose fetch failed.
    pub fn release(&self, identity: &str) {
        self.seen.remove(identity);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Pages each test identity fetched, oldest first.
#[derive(Debug)]
pub struct FetchHistory<V> {
    pages: DashMap<String, Vec<V>>,
}

impl<V: Clone> FetchHistory<V> {
    pub fn new() -> Self {
        Self {
            pages: DashMap::new(),
        }
    }

    pub fn record(&self, identity: &str, page: V) {
        self.pages
            .entry(identity.to_string())
            .or_default()
            .push(page);
    }

    pub fn pages(&self, identity: &str) -> Vec<V> {
        self.pages
            .get(identity)
            .map(|pages| pages.value().clone())
            .unwrap_or_default()
    }

    pub fn nth(&self, identity: &str, index: usize) -> Option<V> {
        self.pages
            .get(identity)
            .and_then(|pages| pages.get(index).cloned())
    }

    pub fn last(&self, identity: &str) -> Option<V> {
        self.pages
            .get(identity)
            .and_then(|pages| pages.last().cloned())
    }

    /// First page, in fetch order, matching `predicate`.
    pub fn find(&self, identity: &str, predicate: impl Fn(&V) -> bool) -> Option<V> {
        self.pages
            .get(identity)
            .and_then(|pages| pages.iter().find(|p| predicate(p)).cloned())
    }

    pub fn clear(&self, identity: &str) {
        self.pages.remove(identity);
    }
}

impl<V: Clone> Default for FetchHistory<V> {
    fn default() -> Self {
        Self::new()
    }
}
