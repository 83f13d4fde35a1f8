//! Per-resource mutual exclusion for check-then-act sequences.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};

use tracing::trace;
use uuid::Uuid;

/// A resource whose bookings must be decided one request at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockKey {
    Doctor(Uuid),
    Room(Uuid),
    Appointment(Uuid),
    Bed(Uuid),
    Patient(Uuid),
}

/// Lock arena keyed by resource id.
///
/// `acquire` takes every requested key at once or waits, so two callers
/// can never each hold half of what the other needs.
#[derive(Debug, Default)]
pub struct ResourceLocks {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until all `keys` are free, then hold them until the guard drops.
    pub fn acquire(&self, keys: &[LockKey]) -> ResourceGuard<'_> {
        let mut wanted: Vec<LockKey> = keys.to_vec();
        wanted.sort();
        wanted.dedup();

        let mut held = self
            .held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while wanted.iter().any(|k| held.contains(k)) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        held.extend(wanted.iter().copied());
        trace!(?wanted, "resource locks acquired");

        ResourceGuard {
            locks: self,
            keys: wanted,
        }
    }

    /// Whether a key is currently held by anyone.
    pub fn is_held(&self, key: LockKey) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(&key))
            .unwrap_or(false)
    }
}

/// Releases its keys on drop.
#[derive(Debug)]
pub struct ResourceGuard<'a> {
    locks: &'a ResourceLocks,
    keys: Vec<LockKey>,
}

impl ResourceGuard<'_> {
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

impl Drop for ResourceGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
