//! Shared type definitions for the persona movement core.
//!
//! This crate is the single source of truth for the records that cross
//! crate boundaries: the world crate produces [`Tile`]s, the core crate
//! turns [`Activity`] entries into [`PathRecord`]s and [`CharacterState`]
//! updates, and the store crate persists them as JSON. Types flow to
//! `TypeScript` via `ts-rs` for the API and dialogue consumers.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for character identifiers
//! - [`structs`] -- Tiles, activities, path records, and runtime state

pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use ids::CharacterId;
pub use structs::{
    ASLEEP_SITE, Activity, CharacterState, MINUTES_PER_DAY, PathRecord, Tile,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::CharacterId::export_all();
        let _ = crate::structs::Tile::export_all();
        let _ = crate::structs::Activity::export_all();
        let _ = crate::structs::PathRecord::export_all();
        let _ = crate::structs::CharacterState::export_all();
    }
}
