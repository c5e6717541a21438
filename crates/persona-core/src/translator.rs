//! Schedule-to-path translation.
//!
//! Turns the activity a character should be doing into a [`PathRecord`]:
//! resolve the activity's site to candidate tiles, narrow them with the
//! configured [`TargetSelection`], and run the path finder from the
//! character's current tile. Translation never fails: every miss degrades
//! to a one-tile stay path.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use persona_types::{Activity, CharacterId, CharacterState, PathRecord, Tile};
use persona_world::{AddressResolver, find_path_to_any};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::{MovementConfig, TargetSelection};

/// Why a character's stored path must be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetranslateReason {
    /// No path is stored.
    Missing,
    /// The current activity's site or action differs from the path's.
    ActivityChanged,
    /// The path's window has ended.
    Expired,
}

impl RetranslateReason {
    /// Short label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::ActivityChanged => "activity_changed",
            Self::Expired => "expired",
        }
    }
}

/// Decide whether `existing` still serves `activity` at `now`.
///
/// `None` means the stored path is current and must be left alone, which
/// keeps repeated translator runs idempotent.
pub fn needs_translation(
    existing: Option<&PathRecord>,
    activity: &Activity,
    now: DateTime<Utc>,
) -> Option<RetranslateReason> {
    let Some(path) = existing else {
        return Some(RetranslateReason::Missing);
    };
    if path.site != activity.site || path.action != activity.action {
        return Some(RetranslateReason::ActivityChanged);
    }
    if now > path.expires_at() {
        return Some(RetranslateReason::Expired);
    }
    None
}

/// Converts activities into path records against a fixed map.
#[derive(Debug, Clone)]
pub struct Translator {
    resolver: Arc<AddressResolver>,
    movement: MovementConfig,
}

impl Translator {
    /// Create a translator over `resolver` with the given tuning.
    pub const fn new(resolver: Arc<AddressResolver>, movement: MovementConfig) -> Self {
        Self { resolver, movement }
    }

    /// The address resolver in use.
    pub const fn resolver(&self) -> &Arc<AddressResolver> {
        &self.resolver
    }

    /// Tile a character occupies right now.
    ///
    /// The runtime state's position when present; otherwise the configured
    /// spawn tile, then the first spawning tile of the map, then `(0, 0)`.
    pub fn starting_tile(&self, state: Option<&CharacterState>) -> Tile {
        state
            .map(|s| s.position)
            .or(self.movement.spawn_tile)
            .or_else(|| self.resolver.grid().spawn_tiles().first().copied())
            .unwrap_or_default()
    }

    /// Build the path record for `activity`, starting at `current`.
    pub fn translate(
        &self,
        character_id: CharacterId,
        activity: &Activity,
        current: Tile,
        now: DateTime<Utc>,
    ) -> PathRecord {
        let tiles = if activity.is_passive() {
            vec![current]
        } else {
            let targets = self.target_tiles(character_id, &activity.site, current);
            if targets.is_empty() {
                vec![current]
            } else {
                find_path_to_any(self.resolver.grid(), current, &targets)
            }
        };

        tracing::debug!(
            character_id = %character_id,
            site = %activity.site,
            from = %current,
            to = %tiles.last().copied().unwrap_or(current),
            steps = tiles.len().saturating_sub(1),
            "path translated"
        );

        PathRecord {
            character_id,
            tiles,
            started_at: now,
            duration_minutes: activity.duration_minutes,
            action: activity.action.clone(),
            site: activity.site.clone(),
            emoji: activity.emoji.clone(),
        }
    }

    /// Candidate destination tiles for `site`, narrowed for the path finder.
    ///
    /// Only passable tiles are candidates. Falls back to the configured
    /// default site when `site` has none. Empty when both miss.
    pub fn target_tiles(
        &self,
        character_id: CharacterId,
        site: &str,
        current: Tile,
    ) -> BTreeSet<Tile> {
        let mut resolved = self.passable_tiles(site);
        if resolved.is_empty() {
            tracing::debug!(
                character_id = %character_id,
                site,
                default_site = %self.movement.default_site,
                "site has no passable tiles, using default site"
            );
            resolved = self.passable_tiles(&self.movement.default_site);
        }
        if resolved.is_empty() {
            tracing::warn!(
                character_id = %character_id,
                site,
                "neither site nor default site resolved, staying put"
            );
            return resolved;
        }
        self.select(character_id, resolved, current)
    }

    fn passable_tiles(&self, address: &str) -> BTreeSet<Tile> {
        let grid = self.resolver.grid();
        self.resolver
            .tiles_for_address(address)
            .into_iter()
            .filter(|t| grid.is_passable(*t))
            .collect()
    }

    fn select(
        &self,
        character_id: CharacterId,
        resolved: BTreeSet<Tile>,
        current: Tile,
    ) -> BTreeSet<Tile> {
        let keep = self.movement.max_candidates.max(1);
        if resolved.len() <= keep {
            return resolved;
        }
        let mut candidates: Vec<Tile> = resolved.into_iter().collect();
        match self.movement.target_selection {
            TargetSelection::Nearest => {
                candidates.sort_by_key(|t| (t.manhattan(current), *t));
            }
            TargetSelection::Seeded => {
                let (hi, lo) = character_id.into_inner().as_u64_pair();
                let mut rng = StdRng::seed_from_u64(self.movement.seed ^ hi ^ lo);
                candidates.shuffle(&mut rng);
            }
        }
        candidates.into_iter().take(keep).collect()
    }
}
