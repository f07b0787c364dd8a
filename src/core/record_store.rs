//! Concurrent keyed record store with one latch per record
//!
//! This module provides the `RecordStore` struct, a generic map from string
//! key to an owned record where every record is co-located with its own
//! exclusive latch.
//!
//! # Design
//!
//! ```text
//! RecordStore<T>
//!     ├── DashMap<Key, Arc<Slot<T>>>   (sharded key -> slot index)
//!     │       └── Slot
//!     │            ├── Latch           (exclusive, try-lockable, cross-call)
//!     │            └── RwLock<T>       (the record cell)
//!     └── Mutex<()>                    (creation guard, insertion only)
//! ```
//!
//! A slot holds both the record and its latch, so a latch exists for a key
//! exactly when a record does.
//!
//! # Latch semantics
//!
//! The latch is not tied to a guard's lifetime: `try_lock` and `unlock` are
//! separate calls, possibly from different threads, which is what lets the
//! transfer orchestrator hold two latches across its prepare/execute/commit
//! phases. `try_lock` never waits for the latch. Synchronized `get`/`set`
//! wait for it, and are woken by `unlock`.
//!
//! # Access modes
//!
//! - [`Access::Synchronized`]: the store takes the record's latch for the
//!   duration of the call. Never use it on a key you already hold, it waits on
//!   itself.
//! - [`Access::Unsynchronized`]: the latch is ignored. Use it while holding the
//!   latch yourself, or during single-threaded setup. Reads and writes are
//!   still memory-safe (the record cell has a short internal guard), they are
//!   just not serialized against a latch holder.

use super::traits::{IdentifiedRecord, Key};
use crate::types::BankingError;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

/// How a `get`/`set` call treats the record's latch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Acquire the latch for the duration of the call (blocking)
    Synchronized,
    /// Ignore the latch; the caller is responsible for exclusion
    Unsynchronized,
}

impl Access {
    /// Map the boundary layer's `safe` flag to an access mode
    pub fn from_safe(safe: bool) -> Self {
        if safe {
            Access::Synchronized
        } else {
            Access::Unsynchronized
        }
    }
}

/// Exclusive latch that can be released by a different call than the one
/// that acquired it
#[derive(Default)]
struct Latch {
    held: Mutex<bool>,
    released: Condvar,
}

impl Latch {
    fn try_acquire(&self) -> bool {
        let mut held = self.held.lock();
        if *held {
            return false;
        }
        *held = true;
        true
    }

    fn acquire(&self) -> LatchGuard<'_> {
        let mut held = self.held.lock();
        while *held {
            self.released.wait(&mut held);
        }
        *held = true;
        LatchGuard { latch: self }
    }

    /// Returns false if the latch was not held
    fn release(&self) -> bool {
        let mut held = self.held.lock();
        if !*held {
            return false;
        }
        *held = false;
        drop(held);
        self.released.notify_one();
        true
    }

    fn is_held(&self) -> bool {
        *self.held.lock()
    }
}

/// Releases a latch taken by a synchronized `get`/`set`
struct LatchGuard<'a> {
    latch: &'a Latch,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latch.release();
    }
}

struct Slot<T> {
    latch: Latch,
    record: RwLock<T>,
}

impl<T: Clone> Slot<T> {
    fn new(record: T) -> Self {
        Slot {
            latch: Latch::default(),
            record: RwLock::new(record),
        }
    }

    fn read(&self, access: Access) -> T {
        match access {
            Access::Synchronized => {
                let _latch = self.latch.acquire();
                self.record.read().clone()
            }
            Access::Unsynchronized => self.record.read().clone(),
        }
    }

    fn write(&self, record: T, access: Access) {
        match access {
            Access::Synchronized => {
                let _latch = self.latch.acquire();
                *self.record.write() = record;
            }
            Access::Unsynchronized => *self.record.write() = record,
        }
    }
}

/// Thread-safe record store with per-key latches
///
/// Explicitly constructed and owned; share it with `Arc`. Independent stores
/// never interact.
pub struct RecordStore<T> {
    /// Slot index; shard guards are never held while waiting on a latch
    slots: DashMap<Key, Arc<Slot<T>>>,

    /// Serializes slot creation so two first-writes to a key cannot race
    create_guard: Mutex<()>,
}

impl<T: IdentifiedRecord> RecordStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        RecordStore {
            slots: DashMap::new(),
            create_guard: Mutex::new(()),
        }
    }

    fn slot(&self, key: &str) -> Option<Arc<Slot<T>>> {
        self.slots.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn slot_or_not_found(&self, key: &str) -> Result<Arc<Slot<T>>, BankingError> {
        self.slot(key)
            .ok_or_else(|| BankingError::record_not_found(key))
    }

    /// Insert a record and its latch if the key is not present yet
    ///
    /// Intended for seeding the store before it is exposed to concurrent
    /// traffic.
    ///
    /// # Errors
    ///
    /// Returns `RecordExists` if the key is already present. The existing
    /// record is left untouched.
    pub fn create_if_absent(&self, key: &str, record: T) -> Result<(), BankingError> {
        let _guard = self.create_guard.lock();
        if self.slots.contains_key(key) {
            return Err(BankingError::record_exists(key));
        }
        self.slots.insert(key.to_string(), Arc::new(Slot::new(record)));
        Ok(())
    }

    /// [`create_if_absent`](Self::create_if_absent) under the record's own key
    pub fn create(&self, record: T) -> Result<(), BankingError> {
        let key = record.record_key();
        self.create_if_absent(&key, record)
    }

    /// Acquire the key's latch without waiting
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if the key is absent
    /// - `RowLocked` if the latch is already held by anyone, including the caller
    pub fn try_lock(&self, key: &str) -> Result<(), BankingError> {
        let slot = self.slot_or_not_found(key)?;
        if slot.latch.try_acquire() {
            Ok(())
        } else {
            Err(BankingError::row_locked(key))
        }
    }

    /// Release the key's latch
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if the key is absent
    /// - `UnlockedBefore` if the latch was not held
    pub fn unlock(&self, key: &str) -> Result<(), BankingError> {
        let slot = self.slot_or_not_found(key)?;
        if slot.latch.release() {
            Ok(())
        } else {
            Err(BankingError::unlocked_before(key))
        }
    }

    /// Whether the key's latch is currently held without waiting for it
    pub fn is_locked(&self, key: &str) -> Result<bool, BankingError> {
        Ok(self.slot_or_not_found(key)?.latch.is_held())
    }

    /// Read a copy of the record
    ///
    /// With [`Access::Synchronized`] this waits for the key's latch.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the key is absent.
    pub fn get(&self, key: &str, access: Access) -> Result<T, BankingError> {
        Ok(self.slot_or_not_found(key)?.read(access))
    }

    /// Read several records, skipping keys that are absent
    pub fn get_many<K: AsRef<str>>(&self, keys: &[K], access: Access) -> Vec<T> {
        keys.iter()
            .filter_map(|key| self.get(key.as_ref(), access).ok())
            .collect()
    }

    /// Overwrite the record for a key
    ///
    /// Unlike [`create_if_absent`](Self::create_if_absent), a missing key is
    /// not an error: the record and its latch are created.
    pub fn set(&self, key: &str, record: T, access: Access) {
        let slot = match self.slot(key) {
            Some(slot) => slot,
            None => {
                let _guard = self.create_guard.lock();
                match self.slot(key) {
                    Some(slot) => slot,
                    None => {
                        self.slots.insert(key.to_string(), Arc::new(Slot::new(record)));
                        return;
                    }
                }
            }
        };
        slot.write(record, access);
    }

    /// Snapshot of all keys, in no particular order
    pub fn keys(&self) -> Vec<Key> {
        self.slots.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<T: IdentifiedRecord> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RecordStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("records", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        value: u32,
    }

    impl Row {
        fn new(id: &str, value: u32) -> Self {
            Row {
                id: id.to_string(),
                value,
            }
        }
    }

    impl IdentifiedRecord for Row {
        fn record_key(&self) -> Key {
            self.id.clone()
        }
    }

    fn seeded(rows: &[(&str, u32)]) -> RecordStore<Row> {
        let store = RecordStore::new();
        for (id, value) in rows {
            store.create(Row::new(id, *value)).unwrap();
        }
        store
    }

    #[test]
    fn test_create_if_absent_rejects_duplicates() {
        let store = seeded(&[("a", 1)]);

        let result = store.create_if_absent("a", Row::new("a", 2));

        assert_eq!(result, Err(BankingError::record_exists("a")));
        assert_eq!(store.get("a", Access::Unsynchronized).unwrap().value, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing_key() {
        let store: RecordStore<Row> = RecordStore::new();

        for access in [Access::Synchronized, Access::Unsynchronized] {
            assert_eq!(
                store.get("missing", access),
                Err(BankingError::record_not_found("missing"))
            );
        }
    }

    #[test]
    fn test_try_lock_missing_key() {
        let store: RecordStore<Row> = RecordStore::new();

        assert_eq!(
            store.try_lock("missing"),
            Err(BankingError::record_not_found("missing"))
        );
        assert_eq!(
            store.unlock("missing"),
            Err(BankingError::record_not_found("missing"))
        );
    }

    #[test]
    fn test_try_lock_on_held_key_fails_immediately() {
        let store = seeded(&[("a", 1)]);
        store.try_lock("a").unwrap();

        let started = Instant::now();
        let result = store.try_lock("a");

        assert_eq!(result, Err(BankingError::row_locked("a")));
        assert!(started.elapsed() < Duration::from_millis(100));
        assert!(store.is_locked("a").unwrap());
    }

    #[test]
    fn test_lock_unlock_cycle() {
        let store = seeded(&[("a", 1)]);

        store.try_lock("a").unwrap();
        store.unlock("a").unwrap();
        store.try_lock("a").unwrap();
        store.unlock("a").unwrap();

        assert!(!store.is_locked("a").unwrap());
    }

    #[test]
    fn test_double_unlock_reports_unlocked_before() {
        let store = seeded(&[("a", 1)]);
        store.try_lock("a").unwrap();

        assert!(store.unlock("a").is_ok());
        assert_eq!(
            store.unlock("a"),
            Err(BankingError::unlocked_before("a"))
        );
    }

    #[test]
    fn test_unlock_without_lock() {
        let store = seeded(&[("a", 1)]);

        assert_eq!(
            store.unlock("a"),
            Err(BankingError::unlocked_before("a"))
        );
        // The failed unlock must not leave the latch held
        assert!(store.try_lock("a").is_ok());
    }

    #[test]
    fn test_latch_released_from_another_thread() {
        let store = Arc::new(seeded(&[("a", 1)]));
        store.try_lock("a").unwrap();

        let store_clone = Arc::clone(&store);
        thread::spawn(move || store_clone.unlock("a"))
            .join()
            .unwrap()
            .unwrap();

        assert!(store.try_lock("a").is_ok());
    }

    #[test]
    fn test_unsynchronized_access_ignores_latch() {
        let store = seeded(&[("a", 1)]);
        store.try_lock("a").unwrap();

        store.set("a", Row::new("a", 5), Access::Unsynchronized);

        assert_eq!(store.get("a", Access::Unsynchronized).unwrap().value, 5);
        assert!(store.is_locked("a").unwrap());
    }

    #[test]
    fn test_synchronized_get_waits_for_latch() {
        let store = Arc::new(seeded(&[("a", 1)]));
        store.try_lock("a").unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let reader = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let row = store.get("a", Access::Synchronized).unwrap();
                done.store(true, Ordering::SeqCst);
                row
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!done.load(Ordering::SeqCst));

        store.set("a", Row::new("a", 7), Access::Unsynchronized);
        store.unlock("a").unwrap();

        let row = reader.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(row.value, 7);
        // The reader released the latch it borrowed
        assert!(!store.is_locked("a").unwrap());
    }

    #[test]
    fn test_synchronized_set_waits_for_latch() {
        let store = Arc::new(seeded(&[("a", 1)]));
        store.try_lock("a").unwrap();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || store.set("a", Row::new("a", 9), Access::Synchronized))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(store.get("a", Access::Unsynchronized).unwrap().value, 1);

        store.unlock("a").unwrap();
        writer.join().unwrap();

        assert_eq!(store.get("a", Access::Synchronized).unwrap().value, 9);
    }

    #[test]
    fn test_set_creates_missing_key_with_latch() {
        let store: RecordStore<Row> = RecordStore::new();

        store.set("b", Row::new("b", 3), Access::Synchronized);

        assert_eq!(store.get("b", Access::Synchronized).unwrap().value, 3);
        assert!(store.try_lock("b").is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_overwrites_existing_record() {
        let store = seeded(&[("a", 1)]);

        store.set("a", Row::new("a", 2), Access::Synchronized);

        assert_eq!(store.get("a", Access::Synchronized).unwrap().value, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_keys_len_and_get_many() {
        let store = seeded(&[("a", 1), ("b", 2), ("c", 3)]);

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(store.len(), 3);
        assert!(!store.is_empty());

        let rows = store.get_many(&["a", "missing", "c"], Access::Synchronized);
        let values: Vec<u32> = rows.iter().map(|row| row.value).collect();
        assert_eq!(values, vec![1, 3]);
    }

    #[test]
    fn test_concurrent_create_same_key_single_winner() {
        let store = Arc::new(RecordStore::<Row>::new());
        let created = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                let created = Arc::clone(&created);
                thread::spawn(move || {
                    if store.create_if_absent("a", Row::new("a", i)).is_ok() {
                        created.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_try_lock_single_winner() {
        let store = Arc::new(seeded(&[("a", 1)]));
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    if store.try_lock("a").is_ok() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_synchronized_increments_are_serialized() {
        let store = Arc::new(seeded(&[("a", 0)]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        loop {
                            if store.try_lock("a").is_ok() {
                                break;
                            }
                            thread::yield_now();
                        }
                        let mut row = store.get("a", Access::Unsynchronized).unwrap();
                        row.value += 1;
                        store.set("a", row, Access::Unsynchronized);
                        store.unlock("a").unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("a", Access::Synchronized).unwrap().value, 800);
    }
}
