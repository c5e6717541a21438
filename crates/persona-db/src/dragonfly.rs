//! `Dragonfly` (Redis-compatible) state operations.
//!
//! `Dragonfly` holds the live movement state shared with the API and
//! dialogue processes. Key patterns are listed in [`crate::store`].

use async_trait::async_trait;
use fred::prelude::*;
use persona_types::{CharacterId, CharacterState, PathRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DbError;
use crate::store::{CHARACTERS_KEY, StateStore, path_key, state_key};

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
///
/// Wraps a [`fred::prelude::Client`] and provides typed operations for the
/// persona key patterns.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    // =========================================================================
    // Generic JSON get/set/delete
    // =========================================================================

    /// Serialize `value` as JSON and store it at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        let _: () = self.client.set(key, json.as_str(), None, None, false).await?;
        Ok(())
    }

    /// Read the value at `key` and deserialize from JSON; a missing key is
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if deserialization fails.
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn find_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        match value {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Delete a key from `Dragonfly`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }

    /// Flush all keys from the `Dragonfly` instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), DbError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl StateStore for DragonflyPool {
    async fn get_path(&self, id: CharacterId) -> Result<Option<PathRecord>, DbError> {
        self.find_json(&path_key(id)).await
    }

    async fn set_path(&self, record: &PathRecord) -> Result<(), DbError> {
        self.set_json(&path_key(record.character_id), record).await
    }

    async fn delete_path(&self, id: CharacterId) -> Result<(), DbError> {
        self.delete(&path_key(id)).await
    }

    async fn get_state(&self, id: CharacterId) -> Result<Option<CharacterState>, DbError> {
        self.find_json(&state_key(id)).await
    }

    async fn set_state(&self, state: &CharacterState) -> Result<(), DbError> {
        self.set_json(&state_key(state.character_id), state).await
    }

    async fn delete_state(&self, id: CharacterId) -> Result<(), DbError> {
        self.delete(&state_key(id)).await
    }

    async fn register_character(&self, id: CharacterId) -> Result<(), DbError> {
        let _: u32 = self
            .client
            .sadd(CHARACTERS_KEY, id.to_string().as_str())
            .await?;
        Ok(())
    }

    async fn unregister_character(&self, id: CharacterId) -> Result<(), DbError> {
        let _: u32 = self
            .client
            .srem(CHARACTERS_KEY, id.to_string().as_str())
            .await?;
        Ok(())
    }

    async fn list_characters(&self) -> Result<Vec<CharacterId>, DbError> {
        let members: Vec<String> = self.client.smembers(CHARACTERS_KEY).await?;
        let mut ids = Vec::with_capacity(members.len());
        for m in &members {
            let id = m.parse::<CharacterId>().map_err(|e| {
                DbError::Config(format!("Invalid UUID in {CHARACTERS_KEY}: {e}"))
            })?;
            ids.push(id);
        }
        ids.sort_unstable();
        Ok(ids)
    }
}
