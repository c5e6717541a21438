//! Error types for the movement core.

use persona_db::DbError;
use persona_world::WorldError;

use crate::config::ConfigError;
use crate::schedule::ScheduleError;

/// Errors surfaced by [`MovementService`](crate::service::MovementService)
/// operations.
///
/// Batch operations never return these; they count them per character.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The state store failed.
    #[error("state store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: DbError,
    },

    /// The schedule source failed or timed out.
    #[error("schedule error: {source}")]
    Schedule {
        /// The underlying schedule error.
        #[from]
        source: ScheduleError,
    },

    /// The configuration is invalid.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The map could not be loaded or queried.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}
