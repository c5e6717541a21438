//! Position advancement along a stored path.
//!
//! A path's phase is recomputed from the wall clock on every call and never
//! cached:
//!
//! ```text
//! NotStarted --(now >= started_at)--> InProgress --(now > started_at + duration)--> Expired
//! ```
//!
//! While in progress the character stands on
//! `tiles[floor(elapsed / duration * (len - 1))]`, so `now == started_at`
//! maps to the first tile and `now == started_at + duration` to the last.
//! A zero-duration path puts the character on its last tile as soon as it
//! has started.

use chrono::{DateTime, Utc};
use persona_types::{PathRecord, Tile};

/// Where a path stands relative to the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPhase {
    /// `now` is before the path's start.
    NotStarted,
    /// The character should stand on `tiles[index]`.
    InProgress {
        /// Index into the path's tiles.
        index: usize,
    },
    /// The path's window has ended.
    Expired,
}

/// Compute the phase of `record` at `now`.
///
/// An empty path is treated as expired.
pub fn path_phase(record: &PathRecord, now: DateTime<Utc>) -> PathPhase {
    if now < record.started_at {
        return PathPhase::NotStarted;
    }
    let Some(last) = record.tiles.len().checked_sub(1) else {
        return PathPhase::Expired;
    };
    let duration_ms = record.duration().num_milliseconds();
    if duration_ms <= 0 {
        return PathPhase::InProgress { index: last };
    }
    if now > record.expires_at() {
        return PathPhase::Expired;
    }

    let elapsed_ms = now
        .signed_duration_since(record.started_at)
        .num_milliseconds()
        .clamp(0, duration_ms);
    let index = u128::try_from(elapsed_ms)
        .ok()
        .zip(u128::try_from(duration_ms).ok())
        .and_then(|(elapsed, duration)| {
            let last = u128::try_from(last).ok()?;
            elapsed.checked_mul(last)?.checked_div(duration)
        })
        .and_then(|i| usize::try_from(i).ok())
        .map_or(last, |i| i.min(last));
    PathPhase::InProgress { index }
}

/// The tile `record` places its character on at `now`, if in progress.
pub fn tile_at(record: &PathRecord, now: DateTime<Utc>) -> Option<Tile> {
    match path_phase(record, now) {
        PathPhase::InProgress { index } => record.tiles.get(index).copied(),
        PathPhase::NotStarted | PathPhase::Expired => None,
    }
}

/// Fraction of the path's window elapsed at `now`, clamped to `[0, 1]`.
///
/// For display only; position updates use the integer form in
/// [`path_phase`].
pub fn progress(record: &PathRecord, now: DateTime<Utc>) -> f64 {
    if now < record.started_at {
        return 0.0;
    }
    let duration_ms = record.duration().num_milliseconds();
    if duration_ms <= 0 {
        return 1.0;
    }
    let elapsed_ms = now
        .signed_duration_since(record.started_at)
        .num_milliseconds()
        .clamp(0, duration_ms);
    // Both values fit in f64's mantissa for any realistic activity length.
    #[allow(clippy::cast_precision_loss)]
    let fraction = elapsed_ms as f64 / duration_ms as f64;
    fraction.clamp(0.0, 1.0)
}
