//! Error types for the `persona-world` crate.
//!
//! Every variant except [`WorldError::Format`] describes broken map assets
//! and is fatal at startup. [`WorldError::Format`] is a per-request error
//! raised only where a caller must supply an exact address shape.

use std::path::PathBuf;

use persona_types::Tile;

/// Errors that can occur while loading or querying the world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A map asset file could not be read.
    #[error("failed to read map asset {path}: {source}")]
    AssetIo {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The map metadata file is not valid JSON for [`MapMeta`].
    ///
    /// [`MapMeta`]: crate::assets::MapMeta
    #[error("failed to parse map metadata {path}: {source}")]
    Metadata {
        /// The metadata file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A map asset has malformed content.
    #[error("malformed map asset {path}: {reason}")]
    MalformedAsset {
        /// The offending file (or layer name for in-memory grids).
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// A layer does not have `width * height` cells.
    #[error("layer {layer} has {actual} cells, expected {expected}")]
    DimensionMismatch {
        /// Name of the layer.
        layer: String,
        /// `width * height`.
        expected: usize,
        /// Number of cells actually supplied.
        actual: usize,
    },

    /// Grid dimensions are zero or too large to index.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A tile breaks the world > sector > arena > object containment.
    #[error("tile {tile} breaks the address hierarchy: {reason}")]
    Hierarchy {
        /// The tile.
        tile: Tile,
        /// Which level is missing.
        reason: &'static str,
    },

    /// A symbolic address does not have the shape the caller requires.
    #[error("malformed address {address:?}: expected {expected}")]
    Format {
        /// The address as supplied.
        address: String,
        /// Description of the required shape.
        expected: &'static str,
    },
}

impl WorldError {
    /// Whether the error comes from broken map assets (fatal at startup)
    /// rather than from a caller-supplied value.
    pub const fn is_config(&self) -> bool {
        !matches!(self, Self::Format { .. })
    }
}
