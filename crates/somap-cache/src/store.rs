//! Shared entry storage behind object pools.
//!
//! A `PoolStore` is shared by `Arc` between every pool of one specialization.
//! Entries are inserted once per key and never updated or removed. Besides
//! the entries, the store tracks one in-flight marker per key being built so
//! that concurrent requesters wait for a single construction.

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A stored object with its insertion time.
#[derive(Debug)]
pub struct CacheEntry<T> {
    /// The pooled object.
    pub value: Arc<T>,
    /// When the object was stored.
    pub cached_at: DateTime<Utc>,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            cached_at: self.cached_at,
        }
    }
}

/// Usage counters of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the store.
    pub hits: u64,
    /// Lookups that found no entry.
    pub misses: u64,
    /// Successful constructions.
    pub builds: u64,
    /// Constructions that failed or were cancelled.
    pub failures: u64,
    /// Entries currently stored.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Per-key marker held while an object is being built.
pub(crate) type InFlight = Arc<Mutex<()>>;

/// Keyed storage shared by pools of one specialization.
#[derive(Debug)]
pub struct PoolStore<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    config: PoolConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    failures: AtomicU64,
}

fn lock<'a, U>(mutex: &'a Mutex<U>, what: &'static str) -> Result<MutexGuard<'a, U>> {
    mutex.lock().map_err(|_| PoolError::LockPoisoned { what })
}

impl<T> PoolStore<T> {
    /// Create an empty store with default configuration.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty store with custom configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity(config.initial_capacity)),
            in_flight: Mutex::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            builds: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Stored object for `key`.
    pub fn get(&self, key: &str) -> Result<Option<Arc<T>>> {
        Ok(lock(&self.entries, "pool entries")?
            .get(key)
            .map(|entry| Arc::clone(&entry.value)))
    }

    /// Stored entry for `key`, including its insertion time.
    pub fn entry(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
        Ok(lock(&self.entries, "pool entries")?.get(key).cloned())
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(lock(&self.entries, "pool entries")?.contains_key(key))
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = lock(&self.entries, "pool entries")?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.entries, "pool entries")?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of the usage counters.
    pub fn stats(&self) -> Result<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            entry_count: self.len()? as u64,
        })
    }

    /// Store `value` under `key` unless an entry exists already.
    ///
    /// Returns the object that ends up stored. An existing entry wins.
    pub(crate) fn insert_if_absent(&self, key: &str, value: T) -> Result<Arc<T>> {
        let mut entries = lock(&self.entries, "pool entries")?;
        let entry = entries.entry(key.to_string()).or_insert_with(|| CacheEntry {
            value: Arc::new(value),
            cached_at: Utc::now(),
        });
        Ok(Arc::clone(&entry.value))
    }

    /// Join the in-flight marker for `key`, registering one if none exists.
    pub(crate) fn join_in_flight(&self, key: &str) -> Result<InFlight> {
        let mut in_flight = lock(&self.in_flight, "in-flight markers")?;
        Ok(Arc::clone(
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }

    /// Drop the in-flight marker for `key` once a build attempt is over.
    ///
    /// Must be called while the caller still holds the marker's lock. After a
    /// success the marker is always removed. After a failure it is kept while
    /// other requesters wait on it, so the next of them retries under the same
    /// marker instead of racing a fresh one.
    pub(crate) fn release_in_flight(&self, key: &str, slot: &InFlight, built: bool) -> Result<()> {
        let mut in_flight = lock(&self.in_flight, "in-flight markers")?;
        let ours = in_flight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot));
        // One reference held by the map, one by the caller.
        if ours && (built || Arc::strong_count(slot) <= 2) {
            in_flight.remove(key);
        }
        Ok(())
    }

    /// Number of keys with an in-flight marker.
    pub fn in_flight_len(&self) -> Result<usize> {
        Ok(lock(&self.in_flight, "in-flight markers")?.len())
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_build(&self) {
        self.builds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Poison the entry lock the way a panicking holder would.
    #[cfg(test)]
    pub(crate) fn poison_entries(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.entries.lock();
            panic!("entry lock holder panicked");
        }));
    }
}

impl<T> Default for PoolStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
