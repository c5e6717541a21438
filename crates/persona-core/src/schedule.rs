//! Schedule source trait, a static implementation, and current-activity
//! selection.
//!
//! Daily schedules are generated upstream. The movement core only needs to
//! ask "what is this character's schedule today" and then pick the entry
//! that covers the current local minute. The [`ScheduleSource`] trait
//! abstracts the mechanism: an LLM-backed planner, a database, or the
//! [`StaticScheduleSource`] used by the engine binary and the tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use persona_types::{Activity, CharacterId, MINUTES_PER_DAY};
use tokio::sync::RwLock;

/// Errors that can occur while fetching a schedule.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The source did not answer within the deadline.
    #[error("schedule for {character_id} timed out (deadline: {deadline_ms}ms)")]
    Timeout {
        /// The character whose schedule was requested.
        character_id: CharacterId,
        /// The deadline in milliseconds.
        deadline_ms: u64,
    },

    /// The source failed to produce a schedule.
    #[error("schedule source error for {character_id}: {message}")]
    Unavailable {
        /// The character whose schedule was requested.
        character_id: CharacterId,
        /// Description of the failure.
        message: String,
    },

    /// A schedules file could not be read.
    #[error("failed to read schedules file {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A schedules file is not valid JSON for `{"<uuid>": [activity, ...]}`.
    #[error("failed to parse schedules file {path}: {source}")]
    Parse {
        /// The file that failed.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A schedules file key is not a character id.
    #[error("invalid character id {key:?} in schedules file: {source}")]
    InvalidId {
        /// The offending key.
        key: String,
        /// The underlying parse error.
        source: uuid::Error,
    },
}

/// A source of daily schedules.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Today's activities for `id`, ordered by start minute.
    ///
    /// A character without a schedule gets an empty list, not an error.
    async fn daily_schedule(&self, id: CharacterId) -> Result<Vec<Activity>, ScheduleError>;
}

/// Schedules held in memory.
///
/// Used by the engine binary (loaded from a JSON file) and by tests.
/// Schedules can be replaced at runtime with [`set_schedule`].
///
/// [`set_schedule`]: StaticScheduleSource::set_schedule
#[derive(Debug, Default)]
pub struct StaticScheduleSource {
    schedules: RwLock<BTreeMap<CharacterId, Vec<Activity>>>,
}

impl StaticScheduleSource {
    /// Create a source serving `schedules`.
    pub fn new(schedules: BTreeMap<CharacterId, Vec<Activity>>) -> Self {
        Self {
            schedules: RwLock::new(schedules),
        }
    }

    /// Load schedules from a JSON file shaped `{"<uuid>": [activity, ...]}`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Io`], [`ScheduleError::Parse`], or
    /// [`ScheduleError::InvalidId`].
    pub fn from_file(path: &Path) -> Result<Self, ScheduleError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ScheduleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: BTreeMap<String, Vec<Activity>> =
            serde_json::from_str(&contents).map_err(|source| ScheduleError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut schedules = BTreeMap::new();
        for (key, mut activities) in raw {
            let id = key
                .parse::<CharacterId>()
                .map_err(|source| ScheduleError::InvalidId {
                    key: key.clone(),
                    source,
                })?;
            activities.sort_by_key(|a| a.start_minute);
            schedules.insert(id, activities);
        }

        tracing::info!(
            path = %path.display(),
            characters = schedules.len(),
            "schedules loaded"
        );
        Ok(Self::new(schedules))
    }

    /// Replace one character's schedule.
    pub async fn set_schedule(&self, id: CharacterId, mut activities: Vec<Activity>) {
        activities.sort_by_key(|a| a.start_minute);
        self.schedules.write().await.insert(id, activities);
    }

    /// Characters that have a schedule.
    pub async fn characters(&self) -> Vec<CharacterId> {
        self.schedules.read().await.keys().copied().collect()
    }
}

#[async_trait]
impl ScheduleSource for StaticScheduleSource {
    async fn daily_schedule(&self, id: CharacterId) -> Result<Vec<Activity>, ScheduleError> {
        Ok(self
            .schedules
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Minutes since local midnight at `now`, for a local time `utc_offset_minutes`
/// ahead of UTC.
pub fn local_minute_of_day(now: DateTime<Utc>, utc_offset_minutes: i32) -> u32 {
    let utc_minute = now.hour().saturating_mul(60).saturating_add(now.minute());
    i64::from(utc_minute)
        .checked_add(i64::from(utc_offset_minutes))
        .and_then(|m| m.checked_rem_euclid(i64::from(MINUTES_PER_DAY)))
        .and_then(|m| u32::try_from(m).ok())
        .unwrap_or(utc_minute)
}

/// The activity in effect at `minute` of the local day.
///
/// Picks the earliest-starting activity whose window covers `minute`
/// (windows wrap past midnight). When none covers it, falls back to the
/// latest activity that started at or before `minute`. `None` for an empty
/// schedule or a minute before every activity.
pub fn current_activity(schedule: &[Activity], minute: u32) -> Option<&Activity> {
    schedule
        .iter()
        .filter(|a| a.covers(minute))
        .min_by_key(|a| a.start_minute)
        .or_else(|| {
            schedule
                .iter()
                .filter(|a| a.start_minute <= minute)
                .max_by_key(|a| a.start_minute)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

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

    fn day() -> Vec<Activity> {
        vec![
            activity(0, 420, "sleeping", "asleep"),
            activity(420, 60, "breakfast", "the Ville:Lin family's house:kitchen"),
            activity(480, 240, "working", "the Ville:Hobbs Cafe:cafe"),
            activity(1320, 240, "sleeping", "asleep"),
        ]
    }

    #[test]
    fn picks_covering_activity() {
        let schedule = day();
        assert_eq!(current_activity(&schedule, 430).unwrap().action, "breakfast");
        assert_eq!(current_activity(&schedule, 480).unwrap().action, "working");
        assert_eq!(current_activity(&schedule, 719).unwrap().action, "working");
    }

    #[test]
    fn gap_falls_back_to_last_started() {
        let schedule = day();
        // 12:00 - 22:00 is not covered; the morning work shift is the last started.
        let current = current_activity(&schedule, 800).unwrap();
        assert_eq!(current.action, "working");
    }

    #[test]
    fn overlap_prefers_earliest_start() {
        let schedule = vec![
            activity(600, 120, "reading", "the Ville:library"),
            activity(630, 30, "phone call", "asleep"),
        ];
        assert_eq!(current_activity(&schedule, 640).unwrap().action, "reading");
    }

    #[test]
    fn wrapped_window_covers_early_morning() {
        let schedule = vec![activity(1380, 480, "sleeping", "asleep")];
        assert_eq!(current_activity(&schedule, 30).unwrap().action, "sleeping");
    }

    #[test]
    fn empty_schedule_has_no_activity() {
        assert!(current_activity(&[], 600).is_none());
        let schedule = vec![activity(600, 60, "late start", "x")];
        assert!(current_activity(&schedule, 10).is_none());
    }

    #[test]
    fn local_minute_applies_offset() {
        let now = Utc.with_ymd_and_hms(2023, 2, 13, 14, 5, 0).unwrap();
        assert_eq!(local_minute_of_day(now, 0), 14 * 60 + 5);
        assert_eq!(local_minute_of_day(now, -300), 9 * 60 + 5);
        assert_eq!(local_minute_of_day(now, 600), 5);
    }

    #[tokio::test]
    async fn static_source_serves_sorted_schedules() {
        let id = CharacterId::new();
        let source = StaticScheduleSource::default();
        source
            .set_schedule(
                id,
                vec![
                    activity(480, 60, "b", "x"),
                    activity(0, 480, "a", "asleep"),
                ],
            )
            .await;

        let schedule = source.daily_schedule(id).await.unwrap();
        assert_eq!(schedule.first().unwrap().action, "a");
        assert!(source.daily_schedule(CharacterId::new()).await.unwrap().is_empty());
        assert_eq!(source.characters().await, vec![id]);
    }

    #[test]
    fn from_file_parses_and_rejects_bad_ids() {
        let dir = tempfile::tempdir().unwrap();
        let id = CharacterId::new();
        let good = dir.path().join("schedules.json");
        std::fs::write(
            &good,
            format!(
                r#"{{"{id}": [{{"start_minute": 420, "duration_minutes": 60,
                    "action": "breakfast", "site": "the Ville:cafe"}}]}}"#
            ),
        )
        .unwrap();
        let source = StaticScheduleSource::from_file(&good).unwrap();
        let schedules = source.schedules.try_read().unwrap();
        assert_eq!(schedules.get(&id).unwrap().len(), 1);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"not-a-uuid": []}"#).unwrap();
        assert!(matches!(
            StaticScheduleSource::from_file(&bad),
            Err(ScheduleError::InvalidId { .. })
        ));

        assert!(matches!(
            StaticScheduleSource::from_file(&dir.path().join("missing.json")),
            Err(ScheduleError::Io { .. })
        ));
    }
}
