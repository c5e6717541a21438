//! State store for the persona movement core.
//!
//! The movement core keeps two documents per character (the current path
//! and the runtime state) plus the set of known characters. Other processes
//! (the API, the dialogue layer) read the same keys.
//!
//! # Modules
//!
//! - [`store`] -- The [`StateStore`] trait and key layout
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) implementation
//! - [`memory`] -- In-process implementation for tests and single-process runs
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod store;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyPool;
pub use error::DbError;
pub use memory::MemoryStore;
pub use store::{CHARACTERS_KEY, StateStore, path_key, state_key};
