//! Core records shared between the movement core and its consumers.
//!
//! Covers the tile coordinate, the scheduled activity handed over by the
//! schedule generator, the stored path record, and the per-character runtime
//! state read by the API and dialogue layers.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::CharacterId;

/// Site value marking an activity that happens wherever the character is.
pub const ASLEEP_SITE: &str = "asleep";

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One grid cell identified by integer `(x, y)`.
///
/// `x` grows to the right and `y` grows downward. Ordering is by `x` first,
/// then `y`, which keeps tile sets deterministic when iterated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Tile {
    /// Column index.
    pub x: u32,
    /// Row index.
    pub y: u32,
}

impl Tile {
    /// Create a tile at `(x, y)`.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan (taxicab) distance between two tiles.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// Whether `other` is exactly one orthogonal step away.
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }
}

impl core::fmt::Display for Tile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(u32, u32)> for Tile {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// One time-boxed entry of a character's daily schedule.
///
/// Produced upstream by the schedule generator. Activities are expected to
/// be ordered by `start_minute` and not to overlap, but nothing here
/// enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Activity {
    /// Position of the activity within the day.
    #[serde(default)]
    pub index: u32,
    /// Start offset in minutes since local midnight.
    pub start_minute: u32,
    /// Length of the activity in minutes.
    pub duration_minutes: u32,
    /// Free-text action label ("brewing coffee").
    pub action: String,
    /// Target site as a symbolic address, or `asleep` / empty when the
    /// activity does not require moving.
    #[serde(default)]
    pub site: String,
    /// Display glyph.
    #[serde(default)]
    pub emoji: String,
}

impl Activity {
    /// Minute of day at which the activity ends (may exceed one day).
    pub const fn end_minute(&self) -> u32 {
        self.start_minute.saturating_add(self.duration_minutes)
    }

    /// Whether the activity keeps the character where it is.
    pub fn is_passive(&self) -> bool {
        let site = self.site.trim();
        site.is_empty() || site.eq_ignore_ascii_case(ASLEEP_SITE)
    }

    /// Whether `minute` (since local midnight) falls inside this activity.
    ///
    /// Activities that run past midnight also cover the early minutes of
    /// the next day.
    pub const fn covers(&self, minute: u32) -> bool {
        let end = self.end_minute();
        if minute >= self.start_minute && minute < end {
            return true;
        }
        end > MINUTES_PER_DAY && minute < end.saturating_sub(MINUTES_PER_DAY)
    }
}

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 1440;

// ---------------------------------------------------------------------------
// PathRecord
// ---------------------------------------------------------------------------

/// A stored movement: ordered tiles plus the wall-clock window during which
/// the character walks them.
///
/// Replaced wholesale whenever the translator runs; the position advancer
/// only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PathRecord {
    /// Owner of the path.
    pub character_id: CharacterId,
    /// Tiles from the current position to the destination, inclusive.
    pub tiles: Vec<Tile>,
    /// Wall-clock instant the walk starts.
    pub started_at: DateTime<Utc>,
    /// Length of the walk window in minutes.
    pub duration_minutes: u32,
    /// Action label of the activity this path serves.
    pub action: String,
    /// Target site of the activity this path serves.
    pub site: String,
    /// Display glyph of the activity.
    #[serde(default)]
    pub emoji: String,
}

impl PathRecord {
    /// Length of the validity window.
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.duration_minutes))
    }

    /// Wall-clock instant after which the path is expired.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.started_at
            .checked_add_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// First tile of the path.
    pub fn origin(&self) -> Option<Tile> {
        self.tiles.first().copied()
    }

    /// Last tile of the path.
    pub fn destination(&self) -> Option<Tile> {
        self.tiles.last().copied()
    }
}

// ---------------------------------------------------------------------------
// CharacterState
// ---------------------------------------------------------------------------

/// The single mutable runtime record per character.
///
/// The position advancer writes `position`; the translator writes the
/// activity fields when it assigns a new path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CharacterState {
    /// Owner of the record.
    pub character_id: CharacterId,
    /// Current tile.
    pub position: Tile,
    /// Current action label.
    pub action: String,
    /// Current target site.
    pub site: String,
    /// Start of the current activity's path window.
    pub started_at: DateTime<Utc>,
    /// Duration of the current activity in minutes.
    pub duration_minutes: u32,
    /// Display glyph.
    #[serde(default)]
    pub emoji: String,
    /// Last time any field of the record was written.
    pub updated_at: DateTime<Utc>,
}

impl CharacterState {
    /// Create a fresh record at `position` with no activity assigned.
    pub const fn spawned(character_id: CharacterId, position: Tile, now: DateTime<Utc>) -> Self {
        Self {
            character_id,
            position,
            action: String::new(),
            site: String::new(),
            started_at: now,
            duration_minutes: 0,
            emoji: String::new(),
            updated_at: now,
        }
    }

    /// Copy the activity fields of `path` into this record.
    pub fn assign_path(&mut self, path: &PathRecord, now: DateTime<Utc>) {
        self.action.clone_from(&path.action);
        self.site.clone_from(&path.site);
        self.emoji.clone_from(&path.emoji);
        self.started_at = path.started_at;
        self.duration_minutes = path.duration_minutes;
        self.updated_at = now;
    }
}
