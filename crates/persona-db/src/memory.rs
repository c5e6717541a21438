//! In-process state store.
//!
//! Backs single-process runs and tests. Values are kept as JSON strings so
//! the store behaves like `Dragonfly` with respect to serialization, and
//! [`MemoryStore::insert_raw`] can plant unparsable data.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use persona_types::{CharacterId, CharacterState, PathRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::store::{StateStore, path_key, state_key};

/// A [`StateStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, String>>,
    characters: RwLock<BTreeSet<CharacterId>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `raw` at `key` verbatim, bypassing serialization.
    pub async fn insert_raw(&self, key: &str, raw: &str) {
        self.values
            .write()
            .await
            .insert(key.to_owned(), raw.to_owned());
    }

    /// Number of stored documents (the character set excluded).
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Whether no documents are stored.
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }

    async fn find<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let values = self.values.read().await;
        match values.get(key) {
            Some(s) => Ok(Some(serde_json::from_str(s)?)),
            None => Ok(None),
        }
    }

    async fn put<T: Serialize + Sync>(&self, key: String, value: &T) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        self.values.write().await.insert(key, json);
        Ok(())
    }

    async fn remove(&self, key: &str) {
        self.values.write().await.remove(key);
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get_path(&self, id: CharacterId) -> Result<Option<PathRecord>, DbError> {
        self.find(&path_key(id)).await
    }

    async fn set_path(&self, record: &PathRecord) -> Result<(), DbError> {
        self.put(path_key(record.character_id), record).await
    }

    async fn delete_path(&self, id: CharacterId) -> Result<(), DbError> {
        self.remove(&path_key(id)).await;
        Ok(())
    }

    async fn get_state(&self, id: CharacterId) -> Result<Option<CharacterState>, DbError> {
        self.find(&state_key(id)).await
    }

    async fn set_state(&self, state: &CharacterState) -> Result<(), DbError> {
        self.put(state_key(state.character_id), state).await
    }

    async fn delete_state(&self, id: CharacterId) -> Result<(), DbError> {
        self.remove(&state_key(id)).await;
        Ok(())
    }

    async fn register_character(&self, id: CharacterId) -> Result<(), DbError> {
        self.characters.write().await.insert(id);
        Ok(())
    }

    async fn unregister_character(&self, id: CharacterId) -> Result<(), DbError> {
        self.characters.write().await.remove(&id);
        Ok(())
    }

    async fn list_characters(&self) -> Result<Vec<CharacterId>, DbError> {
        Ok(self.characters.read().await.iter().copied().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use persona_types::Tile;

    use super::*;

    fn record(id: CharacterId) -> PathRecord {
        PathRecord {
            character_id: id,
            tiles: vec![Tile::new(0, 0), Tile::new(1, 0)],
            started_at: Utc::now(),
            duration_minutes: 10,
            action: String::from("walking"),
            site: String::from("the Ville:park"),
            emoji: String::new(),
        }
    }

    #[tokio::test]
    async fn path_round_trip_and_delete() {
        let store = MemoryStore::new();
        let id = CharacterId::new();
        assert!(store.get_path(id).await.unwrap().is_none());

        let path = record(id);
        store.set_path(&path).await.unwrap();
        assert_eq!(store.get_path(id).await.unwrap(), Some(path));

        store.delete_path(id).await.unwrap();
        assert!(store.get_path(id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn state_is_keyed_per_character() {
        let store = MemoryStore::new();
        let a = CharacterId::new();
        let b = CharacterId::new();
        let now = Utc::now();
        store
            .set_state(&CharacterState::spawned(a, Tile::new(1, 1), now))
            .await
            .unwrap();
        store
            .set_state(&CharacterState::spawned(b, Tile::new(2, 2), now))
            .await
            .unwrap();

        assert_eq!(store.get_state(a).await.unwrap().unwrap().position, Tile::new(1, 1));
        assert_eq!(store.get_state(b).await.unwrap().unwrap().position, Tile::new(2, 2));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn unparsable_value_is_serialization_error() {
        let store = MemoryStore::new();
        let id = CharacterId::new();
        store.insert_raw(&path_key(id), "{not json").await;
        let err = store.get_path(id).await.unwrap_err();
        assert!(err.is_stale_data());
    }

    #[tokio::test]
    async fn character_set_is_sorted_and_deduplicated() {
        let store = MemoryStore::new();
        let a = CharacterId::new();
        let b = CharacterId::new();
        store.register_character(b).await.unwrap();
        store.register_character(a).await.unwrap();
        store.register_character(a).await.unwrap();
        let mut expected = vec![a, b];
        expected.sort_unstable();
        assert_eq!(store.list_characters().await.unwrap(), expected);

        store.unregister_character(a).await.unwrap();
        assert_eq!(store.list_characters().await.unwrap(), vec![b]);
    }
}
