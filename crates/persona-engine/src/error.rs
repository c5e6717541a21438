//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and job execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: persona_core::config::ConfigError,
    },

    /// Map loading failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: persona_world::WorldError,
    },

    /// State store connection or registration failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: persona_db::DbError,
    },

    /// Schedules could not be loaded.
    #[error("schedule error: {source}")]
    Schedule {
        /// The underlying schedule error.
        #[from]
        source: persona_core::schedule::ScheduleError,
    },

    /// A job task failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: persona_core::runner::RunnerError,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
