//! Per-transaction apply locks
//!
//! Two runs that stage changes for the same transaction must not interleave
//! their read-modify-write. Each transaction id gets its own mutex; entries
//! are dropped again once nobody holds them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct ApplyLocks {
    entries: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ApplyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `transaction_id`
    pub fn with_lock<T>(&self, transaction_id: i64, f: impl FnOnce() -> T) -> T {
        let entry = {
            let mut entries = lock_ignoring_poison(&self.entries);
            Arc::clone(entries.entry(transaction_id).or_default())
        };

        let result = {
            let _guard = lock_ignoring_poison(&entry);
            f()
        };

        self.release(transaction_id, entry);
        result
    }

    /// Number of transaction ids with a live lock entry
    pub fn len(&self) -> usize {
        lock_ignoring_poison(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, transaction_id: i64, entry: Arc<Mutex<()>>) {
        let mut entries = lock_ignoring_poison(&self.entries);
        drop(entry);
        // Only the map's own reference left: no holder, no waiter
        if entries
            .get(&transaction_id)
            .is_some_and(|e| Arc::strong_count(e) == 1)
        {
            entries.remove(&transaction_id);
        }
    }
}

/// A panic inside one apply must not wedge every later run
fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
