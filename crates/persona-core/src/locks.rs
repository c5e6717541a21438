//! Per-character critical sections.
//!
//! The translator replaces a character's path and the advancer reads it to
//! move the character. Both hold that character's lock across their whole
//! read-modify-write so neither sees the other's half-finished update.
//! Different characters never contend.

use std::collections::BTreeMap;
use std::sync::Arc;

use persona_types::CharacterId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per character, created on first use.
#[derive(Debug, Default)]
pub struct CharacterLocks {
    locks: Mutex<BTreeMap<CharacterId, Arc<Mutex<()>>>>,
}

impl CharacterLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock of `id`.
    ///
    /// The table itself is only held while looking up the entry, so waiting
    /// on one character never blocks lookups for another.
    pub async fn acquire(&self, id: CharacterId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop the entry of a removed character.
    pub async fn forget(&self, id: CharacterId) {
        self.locks.lock().await.remove(&id);
    }

    /// Number of characters with a lock entry.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Whether no lock entries exist.
    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
