//! Static map, symbolic addresses, and path-finding for the persona town.
//!
//! The map is loaded once at startup and never changes afterwards, so the
//! types here are immutable after construction and shared behind [`Arc`].
//!
//! # Modules
//!
//! - [`assets`] -- Loader for the on-disk map (metadata JSON, block tables,
//!   and flattened CSV layers).
//! - [`grid`] -- [`Grid`]: collision layer plus per-tile address
//!   annotations, and [`GridBuilder`] for in-memory maps.
//! - [`address`] -- [`AddressResolver`]: symbolic address to tile set and
//!   back, plus enumeration of the world hierarchy.
//! - [`pathfinding`] -- A* over the grid with 4-directional movement.
//! - [`error`] -- Error types for asset loading and address queries.
//!
//! [`Arc`]: std::sync::Arc

pub mod address;
pub mod assets;
pub mod error;
pub mod grid;
pub mod pathfinding;

// Re-export primary types at crate root.
pub use address::{ADDRESS_SEPARATOR, AddressLevel, AddressResolver, SPAWN_PREFIX};
pub use assets::{MapMeta, load};
pub use error::WorldError;
pub use grid::{DEFAULT_COLLISION_BLOCK_ID, Grid, GridBuilder, TileRecord};
pub use pathfinding::{find_path, find_path_to_any, is_walkable};
