//! The narrow key-value seam between the movement core and persistence.
//!
//! The core stores two JSON documents per character and one index of known
//! characters. Every write replaces a whole document, so a reader never
//! observes a half-written record.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `persona:{id}:path` | JSON | Current [`PathRecord`] |
//! | `persona:{id}:state` | JSON | Runtime [`CharacterState`] |
//! | `world:personas` | Set | Known character IDs |

use async_trait::async_trait;
use persona_types::{CharacterId, CharacterState, PathRecord};

use crate::error::DbError;

/// Set of every character the engine drives.
pub const CHARACTERS_KEY: &str = "world:personas";

/// Key of a character's path record.
pub fn path_key(id: CharacterId) -> String {
    format!("persona:{id}:path")
}

/// Key of a character's runtime state.
pub fn state_key(id: CharacterId) -> String {
    format!("persona:{id}:state")
}

/// Persistence operations the movement core needs.
///
/// Reads return `Ok(None)` for a missing key. A value that exists but does
/// not parse comes back as [`DbError::Serialization`].
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a character's path record.
    async fn get_path(&self, id: CharacterId) -> Result<Option<PathRecord>, DbError>;

    /// Replace a character's path record.
    async fn set_path(&self, record: &PathRecord) -> Result<(), DbError>;

    /// Delete a character's path record.
    async fn delete_path(&self, id: CharacterId) -> Result<(), DbError>;

    /// Read a character's runtime state.
    async fn get_state(&self, id: CharacterId) -> Result<Option<CharacterState>, DbError>;

    /// Replace a character's runtime state.
    async fn set_state(&self, state: &CharacterState) -> Result<(), DbError>;

    /// Delete a character's runtime state.
    async fn delete_state(&self, id: CharacterId) -> Result<(), DbError>;

    /// Add a character to the known set. Adding twice is a no-op.
    async fn register_character(&self, id: CharacterId) -> Result<(), DbError>;

    /// Remove a character from the known set.
    async fn unregister_character(&self, id: CharacterId) -> Result<(), DbError>;

    /// Every known character, in ascending ID order.
    async fn list_characters(&self) -> Result<Vec<CharacterId>, DbError>;
}
