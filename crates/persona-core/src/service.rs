//! The movement service: the operations other processes call.
//!
//! [`MovementService`] ties the translator and the advancer to the state
//! store, the schedule source, and the per-character locks. Every
//! operation has a `_at` form taking the wall-clock instant explicitly; the
//! plain form passes [`Utc::now`].
//!
//! Single-character operations return [`CoreError`] for store and schedule
//! failures. Batch operations never fail: each character's outcome is
//! counted in a [`BatchReport`] and one character's error never stops the
//! others.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use persona_db::{DbError, StateStore};
use persona_types::{Activity, CharacterId, CharacterState, PathRecord, Tile};
use serde::Serialize;

use crate::advancer::{PathPhase, path_phase};
use crate::config::JobsConfig;
use crate::control::JobControl;
use crate::error::CoreError;
use crate::locks::CharacterLocks;
use crate::schedule::{ScheduleError, ScheduleSource, current_activity, local_minute_of_day};
use crate::translator::{Translator, needs_translation};

/// Counts from one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Characters whose record was written.
    pub updated: usize,
    /// Characters considered.
    pub total: usize,
    /// Characters left alone (nothing to do, stale data, or cancelled).
    pub skipped: usize,
    /// Characters whose operation failed.
    pub errors: usize,
}

/// Per-character result inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Updated,
    Skipped,
    Failed,
}

impl BatchReport {
    fn tally(outcomes: &[Outcome]) -> Self {
        let mut report = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Updated => report.updated = report.updated.saturating_add(1),
                Outcome::Skipped => report.skipped = report.skipped.saturating_add(1),
                Outcome::Failed => report.errors = report.errors.saturating_add(1),
            }
        }
        report
    }
}

/// Translator and advancer bound to a store and a schedule source.
pub struct MovementService {
    translator: Translator,
    store: Arc<dyn StateStore>,
    schedules: Arc<dyn ScheduleSource>,
    locks: CharacterLocks,
    control: Arc<JobControl>,
    jobs: JobsConfig,
    utc_offset_minutes: i32,
}

impl std::fmt::Debug for MovementService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementService")
            .field("translator", &self.translator)
            .field("jobs", &self.jobs)
            .field("utc_offset_minutes", &self.utc_offset_minutes)
            .finish_non_exhaustive()
    }
}

impl MovementService {
    /// Create a service.
    ///
    /// `utc_offset_minutes` places the schedules' local midnight relative
    /// to UTC.
    pub fn new(
        translator: Translator,
        store: Arc<dyn StateStore>,
        schedules: Arc<dyn ScheduleSource>,
        control: Arc<JobControl>,
        jobs: JobsConfig,
        utc_offset_minutes: i32,
    ) -> Self {
        Self {
            translator,
            store,
            schedules,
            locks: CharacterLocks::new(),
            control,
            jobs,
            utc_offset_minutes,
        }
    }

    /// The translator in use.
    pub const fn translator(&self) -> &Translator {
        &self.translator
    }

    /// The shared job control.
    pub const fn control(&self) -> &Arc<JobControl> {
        &self.control
    }

    // -----------------------------------------------------------------------
    // Translation
    // -----------------------------------------------------------------------

    /// Translate the character's current activity into a stored path.
    ///
    /// See [`resolve_and_store_path_at`](Self::resolve_and_store_path_at).
    pub async fn resolve_and_store_path(&self, id: CharacterId) -> Result<bool, CoreError> {
        self.resolve_and_store_path_at(id, Utc::now()).await
    }

    /// Translate the activity in effect at `now` into a stored path.
    ///
    /// Returns `Ok(true)` when a new path was written, `Ok(false)` when the
    /// character has no current activity or its stored path still serves
    /// that activity. A stored path or state that no longer parses is
    /// replaced.
    pub async fn resolve_and_store_path_at(
        &self,
        id: CharacterId,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let _guard = self.locks.acquire(id).await;

        let schedule = self.fetch_schedule(id).await?;
        let minute = local_minute_of_day(now, self.utc_offset_minutes);
        let Some(activity) = current_activity(&schedule, minute) else {
            tracing::debug!(character_id = %id, minute, "no current activity");
            return Ok(false);
        };

        let existing = tolerate_stale(id, "path", self.store.get_path(id).await)?;
        let Some(reason) = needs_translation(existing.as_ref(), activity, now) else {
            return Ok(false);
        };

        let state = tolerate_stale(id, "state", self.store.get_state(id).await)?;
        let current = self.translator.starting_tile(state.as_ref());
        let path = self.translator.translate(id, activity, current, now);
        self.store.set_path(&path).await?;

        let mut state = state.unwrap_or_else(|| CharacterState::spawned(id, current, now));
        state.assign_path(&path, now);
        self.store.set_state(&state).await?;
        self.store.register_character(id).await?;

        tracing::info!(
            character_id = %id,
            reason = reason.as_str(),
            action = %path.action,
            site = %path.site,
            tiles = path.tiles.len(),
            duration_minutes = path.duration_minutes,
            "path assigned"
        );
        Ok(true)
    }

    /// Run [`resolve_and_store_path`](Self::resolve_and_store_path) for
    /// every known character.
    pub async fn resolve_all_paths(&self) -> BatchReport {
        self.resolve_all_paths_at(Utc::now()).await
    }

    /// Batch translation at `now`.
    pub async fn resolve_all_paths_at(&self, now: DateTime<Utc>) -> BatchReport {
        let Some(ids) = self.known_characters("translate").await else {
            return BatchReport {
                errors: 1,
                ..BatchReport::default()
            };
        };
        let outcomes: Vec<Outcome> = stream::iter(ids)
            .map(|id| async move {
                if self.control.is_stop_requested() {
                    return Outcome::Skipped;
                }
                match self.resolve_and_store_path_at(id, now).await {
                    Ok(true) => Outcome::Updated,
                    Ok(false) => Outcome::Skipped,
                    Err(e) => {
                        tracing::warn!(character_id = %id, error = %e, "translation failed");
                        Outcome::Failed
                    }
                }
            })
            .buffer_unordered(self.jobs.worker_limit.max(1))
            .collect()
            .await;
        BatchReport::tally(&outcomes)
    }

    // -----------------------------------------------------------------------
    // Advancement
    // -----------------------------------------------------------------------

    /// Move the character to the tile its path prescribes right now.
    ///
    /// See [`advance_position_at`](Self::advance_position_at).
    pub async fn advance_position(&self, id: CharacterId) -> Result<bool, CoreError> {
        self.advance_position_at(id, Utc::now()).await
    }

    /// Move the character to the tile its path prescribes at `now`.
    ///
    /// Returns `Ok(true)` when the position was written. Returns `Ok(false)`
    /// without writing when the path is missing, shorter than two tiles,
    /// unparsable, not yet started, or expired. Calling twice with the same
    /// `now` stores the same tile.
    pub async fn advance_position_at(
        &self,
        id: CharacterId,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let _guard = self.locks.acquire(id).await;

        let path = match self.store.get_path(id).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                tracing::warn!(character_id = %id, "no path stored, skipping");
                return Ok(false);
            }
            Err(e) if e.is_stale_data() => {
                tracing::warn!(character_id = %id, error = %e, "stored path unparsable, skipping");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        if path.tiles.len() < 2 {
            tracing::warn!(
                character_id = %id,
                tiles = path.tiles.len(),
                "path shorter than two tiles, skipping"
            );
            return Ok(false);
        }

        let index = match path_phase(&path, now) {
            PathPhase::InProgress { index } => index,
            PathPhase::NotStarted => {
                tracing::trace!(character_id = %id, "path not started");
                return Ok(false);
            }
            PathPhase::Expired => {
                tracing::trace!(character_id = %id, "path expired");
                return Ok(false);
            }
        };
        let Some(tile) = path.tiles.get(index).copied() else {
            return Ok(false);
        };

        let mut state = match tolerate_stale(id, "state", self.store.get_state(id).await)? {
            Some(state) => state,
            None => adopted_state(&path, tile, now),
        };
        state.position = tile;
        state.updated_at = now;
        self.store.set_state(&state).await?;

        tracing::trace!(character_id = %id, %tile, index, "position advanced");
        Ok(true)
    }

    /// Run [`advance_position`](Self::advance_position) for every known
    /// character.
    pub async fn advance_all_positions(&self) -> BatchReport {
        self.advance_all_positions_at(Utc::now()).await
    }

    /// Batch advancement at `now`.
    pub async fn advance_all_positions_at(&self, now: DateTime<Utc>) -> BatchReport {
        let Some(ids) = self.known_characters("advance").await else {
            return BatchReport {
                errors: 1,
                ..BatchReport::default()
            };
        };
        let outcomes: Vec<Outcome> = stream::iter(ids)
            .map(|id| async move {
                if self.control.is_stop_requested() {
                    return Outcome::Skipped;
                }
                match self.advance_position_at(id, now).await {
                    Ok(true) => Outcome::Updated,
                    Ok(false) => Outcome::Skipped,
                    Err(e) => {
                        tracing::warn!(character_id = %id, error = %e, "advance failed");
                        Outcome::Failed
                    }
                }
            })
            .buffer_unordered(self.jobs.worker_limit.max(1))
            .collect()
            .await;
        BatchReport::tally(&outcomes)
    }

    // -----------------------------------------------------------------------
    // Queries and membership
    // -----------------------------------------------------------------------

    /// The character's current tile, `None` when it has no runtime state.
    pub async fn current_tile(&self, id: CharacterId) -> Result<Option<Tile>, CoreError> {
        Ok(self.store.get_state(id).await?.map(|s| s.position))
    }

    /// Add a character to the set driven by the batch jobs.
    pub async fn register_character(&self, id: CharacterId) -> Result<(), CoreError> {
        self.store.register_character(id).await?;
        tracing::debug!(character_id = %id, "character registered");
        Ok(())
    }

    /// Remove a character and delete its path and runtime state.
    pub async fn remove_character(&self, id: CharacterId) -> Result<(), CoreError> {
        {
            let _guard = self.locks.acquire(id).await;
            self.store.unregister_character(id).await?;
            self.store.delete_path(id).await?;
            self.store.delete_state(id).await?;
        }
        self.locks.forget(id).await;
        tracing::info!(character_id = %id, "character removed");
        Ok(())
    }

    async fn fetch_schedule(&self, id: CharacterId) -> Result<Vec<Activity>, ScheduleError> {
        let deadline_ms = self.jobs.schedule_fetch_timeout_ms;
        tokio::time::timeout(
            Duration::from_millis(deadline_ms),
            self.schedules.daily_schedule(id),
        )
        .await
        .map_err(|_elapsed| ScheduleError::Timeout {
            character_id: id,
            deadline_ms,
        })?
    }

    async fn known_characters(&self, job: &'static str) -> Option<Vec<CharacterId>> {
        match self.store.list_characters().await {
            Ok(ids) => Some(ids),
            Err(e) => {
                tracing::error!(job, error = %e, "failed to list characters");
                None
            }
        }
    }
}

/// Map unparsable stored data to `None` so it gets rewritten.
fn tolerate_stale<T>(
    id: CharacterId,
    what: &'static str,
    result: Result<Option<T>, DbError>,
) -> Result<Option<T>, DbError> {
    match result {
        Err(e) if e.is_stale_data() => {
            tracing::warn!(
                character_id = %id,
                record = what,
                error = %e,
                "stored record unparsable"
            );
            Ok(None)
        }
        other => other,
    }
}

/// Runtime state for a character whose path exists but whose state record
/// was lost.
fn adopted_state(path: &PathRecord, tile: Tile, now: DateTime<Utc>) -> CharacterState {
    let mut state = CharacterState::spawned(path.character_id, tile, now);
    state.assign_path(path, now);
    state
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};
    use persona_db::{MemoryStore, path_key, state_key};
    use persona_world::{AddressResolver, GridBuilder, is_walkable};

    use super::*;
    use crate::config::MovementConfig;
    use crate::schedule::StaticScheduleSource;

    /// 12x8 town: a cafe in the north-east, a park in the south-west.
    fn translator() -> Translator {
        let mut builder = GridBuilder::new("the Ville", 12, 8)
            .block_rect(Tile::new(5, 2), Tile::new(5, 6))
            .spawn(Tile::new(0, 0), "sp-A");
        for x in 8..12 {
            for y in 0..3 {
                builder = builder.annotate(Tile::new(x, y), "Hobbs Cafe", "cafe", None);
            }
        }
        builder = builder.annotate(Tile::new(11, 0), "Hobbs Cafe", "cafe", Some("counter"));
        for x in 0..4 {
            builder = builder.annotate(Tile::new(x, 7), "Johnson Park", "park", None);
        }
        let resolver = AddressResolver::new(Arc::new(builder.build().unwrap()));
        Translator::new(
            Arc::new(resolver),
            MovementConfig {
                default_site: String::from("the Ville:Johnson Park"),
                ..MovementConfig::default()
            },
        )
    }

    fn activity(start: u32, duration: u32, action: &str, site: &str) -> Activity {
        Activity {
            index: 0,
            start_minute: start,
            duration_minutes: duration,
            action: action.to_owned(),
            site: site.to_owned(),
            emoji: String::new(),
        }
    }

    /// 09:00 UTC on a fixed day.
    fn nine_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 2, 13, 9, 0, 0).unwrap()
    }

    struct Fixture {
        service: MovementService,
        store: Arc<MemoryStore>,
        schedules: Arc<StaticScheduleSource>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let schedules = Arc::new(StaticScheduleSource::default());
        let service = MovementService::new(
            translator(),
            Arc::clone(&store) as Arc<dyn StateStore>,
            Arc::clone(&schedules) as Arc<dyn ScheduleSource>,
            Arc::new(JobControl::new()),
            JobsConfig::default(),
            0,
        );
        Fixture {
            service,
            store,
            schedules,
        }
    }

    fn stored_path(
        id: CharacterId,
        tiles: Vec<Tile>,
        started_at: DateTime<Utc>,
        minutes: u32,
    ) -> PathRecord {
        PathRecord {
            character_id: id,
            tiles,
            started_at,
            duration_minutes: minutes,
            action: String::from("walking"),
            site: String::from("the Ville:Johnson Park"),
            emoji: String::new(),
        }
    }

    #[tokio::test]
    async fn resolve_creates_path_and_state() {
        let f = fixture();
        let id = CharacterId::new();
        f.schedules
            .set_schedule(
                id,
                vec![activity(540, 60, "serving coffee", "the Ville:Hobbs Cafe:cafe:counter")],
            )
            .await;

        let now = nine_am();
        assert!(f.service.resolve_and_store_path_at(id, now).await.unwrap());

        let path = f.store.get_path(id).await.unwrap().unwrap();
        assert_eq!(path.origin(), Some(Tile::new(0, 0)));
        assert_eq!(path.destination(), Some(Tile::new(11, 0)));
        assert_eq!(path.started_at, now);
        assert_eq!(path.duration_minutes, 60);
        assert!(is_walkable(f.service.translator().resolver().grid(), &path.tiles));

        let state = f.store.get_state(id).await.unwrap().unwrap();
        assert_eq!(state.position, Tile::new(0, 0));
        assert_eq!(state.action, "serving coffee");
        assert_eq!(f.store.list_characters().await.unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn resolve_is_idempotent_while_activity_holds() {
        let f = fixture();
        let id = CharacterId::new();
        f.schedules
            .set_schedule(
                id,
                vec![activity(540, 60, "serving coffee", "the Ville:Hobbs Cafe:cafe")],
            )
            .await;
        let now = nine_am();
        assert!(f.service.resolve_and_store_path_at(id, now).await.unwrap());
        let first = f.store.get_path(id).await.unwrap();

        assert!(!f
            .service
            .resolve_and_store_path_at(id, now + TimeDelta::minutes(10))
            .await
            .unwrap());
        assert_eq!(f.store.get_path(id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn activity_change_keeps_position() {
        let f = fixture();
        let id = CharacterId::new();
        f.schedules
            .set_schedule(
                id,
                vec![
                    activity(540, 60, "serving coffee", "the Ville:Hobbs Cafe:cafe"),
                    activity(600, 60, "walking", "the Ville:Johnson Park:park"),
                ],
            )
            .await;

        let now = nine_am();
        f.service.resolve_and_store_path_at(id, now).await.unwrap();
        f.service
            .advance_position_at(id, now + TimeDelta::minutes(60))
            .await
            .unwrap();
        let at_cafe = f.service.current_tile(id).await.unwrap().unwrap();

        let later = now + TimeDelta::minutes(61);
        assert!(f.service.resolve_and_store_path_at(id, later).await.unwrap());
        let path = f.store.get_path(id).await.unwrap().unwrap();
        assert_eq!(path.origin(), Some(at_cafe));
        assert_eq!(path.action, "walking");
        assert_eq!(path.destination().unwrap().y, 7);
        assert_eq!(f.service.current_tile(id).await.unwrap(), Some(at_cafe));
    }

    #[tokio::test]
    async fn no_current_activity_writes_nothing() {
        let f = fixture();
        let id = CharacterId::new();
        f.schedules.set_schedule(id, vec![activity(600, 60, "late", "x")]).await;
        assert!(!f.service.resolve_and_store_path_at(id, nine_am()).await.unwrap());
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn slow_schedule_source_times_out() {
        struct Slow;

        #[async_trait]
        impl ScheduleSource for Slow {
            async fn daily_schedule(
                &self,
                _id: CharacterId,
            ) -> Result<Vec<Activity>, ScheduleError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Vec::new())
            }
        }

        let service = MovementService::new(
            translator(),
            Arc::new(MemoryStore::new()),
            Arc::new(Slow),
            Arc::new(JobControl::new()),
            JobsConfig {
                schedule_fetch_timeout_ms: 10,
                ..JobsConfig::default()
            },
            0,
        );
        let err = service
            .resolve_and_store_path_at(CharacterId::new(), nine_am())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Schedule {
                source: ScheduleError::Timeout { deadline_ms: 10, .. }
            }
        ));
    }

    #[tokio::test]
    async fn advance_boundaries() {
        let f = fixture();
        let id = CharacterId::new();
        let start = nine_am();
        let tiles = vec![Tile::new(0, 0), Tile::new(1, 0), Tile::new(2, 0)];
        f.store.set_path(&stored_path(id, tiles, start, 10)).await.unwrap();

        assert!(!f.service.advance_position_at(id, start - TimeDelta::seconds(1)).await.unwrap());
        assert_eq!(f.service.current_tile(id).await.unwrap(), None);

        assert!(f.service.advance_position_at(id, start).await.unwrap());
        assert_eq!(f.service.current_tile(id).await.unwrap(), Some(Tile::new(0, 0)));

        let end = start + TimeDelta::minutes(10);
        assert!(f.service.advance_position_at(id, end).await.unwrap());
        assert_eq!(f.service.current_tile(id).await.unwrap(), Some(Tile::new(2, 0)));

        let past = end + TimeDelta::seconds(1);
        let before = f.store.get_state(id).await.unwrap();
        assert!(!f.service.advance_position_at(id, past).await.unwrap());
        assert_eq!(f.store.get_state(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn advance_is_idempotent() {
        let f = fixture();
        let id = CharacterId::new();
        let start = nine_am();
        let tiles: Vec<Tile> = (0..6).map(|x| Tile::new(x, 0)).collect();
        f.store.set_path(&stored_path(id, tiles, start, 5)).await.unwrap();

        let at = start + TimeDelta::seconds(130);
        f.service.advance_position_at(id, at).await.unwrap();
        let first = f.store.get_state(id).await.unwrap();
        f.service.advance_position_at(id, at).await.unwrap();
        assert_eq!(f.store.get_state(id).await.unwrap(), first);
        assert_eq!(first.unwrap().position, Tile::new(2, 0));
    }

    #[tokio::test]
    async fn zero_duration_writes_final_tile() {
        let f = fixture();
        let id = CharacterId::new();
        let now = Utc::now();
        let tiles = vec![Tile::new(0, 0), Tile::new(0, 1), Tile::new(0, 2)];
        f.store
            .set_path(&stored_path(id, tiles, now - TimeDelta::minutes(5), 0))
            .await
            .unwrap();

        assert!(f.service.advance_position(id).await.unwrap());
        assert_eq!(f.service.current_tile(id).await.unwrap(), Some(Tile::new(0, 2)));
    }

    #[tokio::test]
    async fn advance_skips_missing_short_and_corrupt_paths() {
        let f = fixture();
        let now = nine_am();

        let missing = CharacterId::new();
        assert!(!f.service.advance_position_at(missing, now).await.unwrap());

        let short = CharacterId::new();
        f.store
            .set_path(&stored_path(short, vec![Tile::new(3, 3)], now, 10))
            .await
            .unwrap();
        assert!(!f.service.advance_position_at(short, now).await.unwrap());

        let corrupt = CharacterId::new();
        f.store.insert_raw(&path_key(corrupt), "[1, 2").await;
        assert!(!f.service.advance_position_at(corrupt, now).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_state_is_rebuilt_from_path() {
        let f = fixture();
        let id = CharacterId::new();
        let start = nine_am();
        f.store
            .set_path(&stored_path(id, vec![Tile::new(0, 0), Tile::new(1, 0)], start, 10))
            .await
            .unwrap();
        f.store.insert_raw(&state_key(id), "not json").await;

        assert!(f.service.advance_position_at(id, start).await.unwrap());
        let state = f.store.get_state(id).await.unwrap().unwrap();
        assert_eq!(state.position, Tile::new(0, 0));
        assert_eq!(state.action, "walking");
    }

    #[tokio::test]
    async fn batch_moves_each_character_along_its_own_path() {
        let f = fixture();
        let start = nine_am();
        let a = CharacterId::new();
        let b = CharacterId::new();
        let idle = CharacterId::new();
        f.store
            .set_path(&stored_path(
                a,
                vec![Tile::new(0, 0), Tile::new(1, 0), Tile::new(2, 0)],
                start,
                10,
            ))
            .await
            .unwrap();
        f.store
            .set_path(&stored_path(
                b,
                vec![Tile::new(9, 9), Tile::new(9, 8), Tile::new(9, 7)],
                start,
                10,
            ))
            .await
            .unwrap();
        for id in [a, b, idle] {
            f.service.register_character(id).await.unwrap();
        }

        let report = f
            .service
            .advance_all_positions_at(start + TimeDelta::minutes(10))
            .await;
        assert_eq!(
            report,
            BatchReport {
                updated: 2,
                total: 3,
                skipped: 1,
                errors: 0
            }
        );
        assert_eq!(f.service.current_tile(a).await.unwrap(), Some(Tile::new(2, 0)));
        assert_eq!(f.service.current_tile(b).await.unwrap(), Some(Tile::new(9, 7)));
    }

    #[tokio::test]
    async fn batch_translation_then_advance() {
        let f = fixture();
        let now = nine_am();
        let mut schedules = BTreeMap::new();
        let a = CharacterId::new();
        let b = CharacterId::new();
        schedules.insert(a, vec![activity(540, 30, "coffee", "the Ville:Hobbs Cafe:cafe")]);
        schedules.insert(b, vec![activity(0, 1440, "sleeping", "asleep")]);
        for (id, activities) in schedules {
            f.schedules.set_schedule(id, activities).await;
            f.service.register_character(id).await.unwrap();
        }

        let translated = f.service.resolve_all_paths_at(now).await;
        assert_eq!(translated.updated, 2);
        assert_eq!(translated.errors, 0);

        let advanced = f.service.advance_all_positions_at(now + TimeDelta::minutes(30)).await;
        // The sleeper holds a one-tile stay path and is skipped.
        assert_eq!(advanced.updated, 1);
        assert_eq!(advanced.skipped, 1);
        let a_tile = f.service.current_tile(a).await.unwrap().unwrap();
        assert!(a_tile.x >= 8 && a_tile.y <= 2);
    }

    #[tokio::test]
    async fn stop_request_skips_remaining_characters() {
        let f = fixture();
        let id = CharacterId::new();
        f.store
            .set_path(&stored_path(id, vec![Tile::new(0, 0), Tile::new(1, 0)], nine_am(), 10))
            .await
            .unwrap();
        f.service.register_character(id).await.unwrap();
        f.service.control().request_stop();

        let report = f.service.advance_all_positions_at(nine_am()).await;
        assert_eq!(report.skipped, 1);
        assert_eq!(report.updated, 0);
    }

    #[tokio::test]
    async fn remove_character_deletes_everything() {
        let f = fixture();
        let id = CharacterId::new();
        f.schedules
            .set_schedule(id, vec![activity(540, 60, "coffee", "the Ville:Hobbs Cafe:cafe")])
            .await;
        f.service.resolve_and_store_path_at(id, nine_am()).await.unwrap();

        f.service.remove_character(id).await.unwrap();
        assert!(f.store.is_empty().await);
        assert!(f.store.list_characters().await.unwrap().is_empty());
        assert_eq!(f.service.current_tile(id).await.unwrap(), None);
    }
}
