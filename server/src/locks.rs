//! Per-resource async mutual exclusion.
//!
//! Mutations of one community (or one post) are serialized in-process;
//! different keys never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

/// Exclusive access to one key.
///
/// On drop the entry is removed from the table unless another task holds or
/// awaits the same key, so the table only holds keys in use.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Release first so our clone no longer counts.
        self.guard.take();
        self.locks
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl KeyedLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: Uuid) -> KeyGuard<'_> {
        // Built before the await so a cancelled wait still cleans up.
        let mut held = KeyGuard {
            locks: self,
            key,
            guard: None,
        };
        // Clone the Arc out so the DashMap shard lock is not held across the await.
        let mutex = Arc::clone(
            self.locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
