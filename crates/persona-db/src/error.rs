//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`fred`] and [`serde_json`] errors with additional context about which
//! operation failed.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A stored value could not be serialized or deserialized.
    ///
    /// On reads this marks stale or corrupted data; callers skip the
    /// character rather than fail the batch.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Whether the error means the stored value is unusable rather than the
    /// store being unreachable.
    pub const fn is_stale_data(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }
}
