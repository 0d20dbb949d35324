//! Versioned rate-record store with optimistic concurrency.
//!
//! The limiter's read-filter-append-write sequence must be indivisible, so
//! the store exposes a versioned load plus a compare-and-swap write instead
//! of a plain get/set pair. `MemoryStore` is the in-process implementation;
//! a remote shared store plugs in behind the same trait using its native
//! conditional-write primitive.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store transaction contended after {0} attempts")]
    Contended(u32),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Request history for one `(namespace, device)` key.
#[derive(Debug, Clone, Default)]
pub struct RateRecord {
    /// Request timestamps (ms since epoch) inside the trailing window,
    /// oldest first.
    pub timestamps: Vec<u64>,
    /// Timestamp of the most recent request, used for idle-key pruning.
    pub last_request: u64,
}

pub type Version = u64;

pub trait RateStore: Send + Sync {
    /// Load a record together with its version, or `None` if absent.
    fn load(&self, key: &str) -> Result<Option<(RateRecord, Version)>, StoreError>;

    /// Conditional write. `expected = None` means "create only if absent".
    /// Returns `false` when the condition no longer holds and nothing was
    /// written.
    fn store(
        &self,
        key: &str,
        expected: Option<Version>,
        record: RateRecord,
    ) -> Result<bool, StoreError>;

    /// Drop every record whose last request is at or before `cutoff_ms`.
    fn sweep(&self, cutoff_ms: u64);
}

/// In-process store backed by a sharded concurrent map. The entry lock
/// makes each compare-and-swap atomic with respect to concurrent writers.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, (RateRecord, Version)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<(RateRecord, Version)>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn store(
        &self,
        key: &str,
        expected: Option<Version>,
        record: RateRecord,
    ) -> Result<bool, StoreError> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get().1;
                if expected == Some(current) {
                    occupied.insert((record, current + 1));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                if expected.is_none() {
                    vacant.insert((record, 1));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    fn sweep(&self, cutoff_ms: u64) {
        self.entries
            .retain(|_, (record, _)| record.last_request > cutoff_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamps: &[u64]) -> RateRecord {
        RateRecord {
            timestamps: timestamps.to_vec(),
            last_request: timestamps.last().copied().unwrap_or(0),
        }
    }

    #[test]
    fn create_only_if_absent() {
        let store = MemoryStore::new();
        assert!(store.store("k", None, record(&[1])).unwrap());
        // Second create against an existing key loses.
        assert!(!store.store("k", None, record(&[2])).unwrap());

        let (loaded, version) = store.load("k").unwrap().unwrap();
        assert_eq!(loaded.timestamps, vec![1]);
        assert_eq!(version, 1);
    }

    #[test]
    fn stale_version_loses_the_race() {
        let store = MemoryStore::new();
        store.store("k", None, record(&[1])).unwrap();
        let (_, version) = store.load("k").unwrap().unwrap();

        // A concurrent writer bumps the version.
        assert!(store.store("k", Some(version), record(&[1, 2])).unwrap());

        // The first writer's version is now stale.
        assert!(!store.store("k", Some(version), record(&[1, 3])).unwrap());

        let (loaded, _) = store.load("k").unwrap().unwrap();
        assert_eq!(loaded.timestamps, vec![1, 2]);
    }

    #[test]
    fn sweep_drops_idle_records_only() {
        let store = MemoryStore::new();
        store.store("old", None, record(&[1_000])).unwrap();
        store.store("fresh", None, record(&[5_000])).unwrap();

        store.sweep(2_000);

        assert!(store.load("old").unwrap().is_none());
        assert!(store.load("fresh").unwrap().is_some());
        assert_eq!(store.len(), 1);
    }
}
