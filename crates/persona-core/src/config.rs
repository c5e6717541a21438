//! Configuration loading and typed config structures for the movement core.
//!
//! The configuration lives in `persona-config.yaml` at the project root.
//! This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file and applies
//! environment overrides.

use std::path::{Path, PathBuf};

use persona_types::{MINUTES_PER_DAY, Tile};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is unusable.
    #[error("invalid config value {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// All fields have defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersonaConfig {
    /// Map asset location.
    #[serde(default)]
    pub map: MapConfig,

    /// Translator and advancer tuning.
    #[serde(default)]
    pub movement: MovementConfig,

    /// Periodic job cadence and fan-out.
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Store and schedule source selection.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PersonaConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `DRAGONFLY_URL` overrides `infrastructure.dragonfly_url`
    /// - `PERSONA_MAP_DIR` overrides `map.dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override values with environment variables when set.
    ///
    /// This allows Docker Compose (or any deployment) to set connection
    /// strings and paths without modifying the YAML file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.infrastructure.dragonfly_url = val;
        }
        if let Ok(val) = std::env::var("PERSONA_MAP_DIR") {
            self.map.dir = PathBuf::from(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs.advance_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "jobs.advance_interval_ms",
                reason: "must be positive".to_owned(),
            });
        }
        if self.jobs.translate_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "jobs.translate_interval_ms",
                reason: "must be positive".to_owned(),
            });
        }
        if self.jobs.worker_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "jobs.worker_limit",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.movement.max_candidates == 0 {
            return Err(ConfigError::Invalid {
                field: "movement.max_candidates",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.movement.utc_offset_minutes.unsigned_abs() >= MINUTES_PER_DAY {
            return Err(ConfigError::Invalid {
                field: "movement.utc_offset_minutes",
                reason: format!("{} is more than a day", self.movement.utc_offset_minutes),
            });
        }
        Ok(())
    }
}

/// Map asset configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapConfig {
    /// Directory containing `matrix/`.
    #[serde(default = "default_map_dir")]
    pub dir: PathBuf,

    /// Collision block id; overrides the map metadata when set.
    #[serde(default)]
    pub collision_block_id: Option<u32>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            dir: default_map_dir(),
            collision_block_id: None,
        }
    }
}

/// How the translator picks among the tiles an address resolves to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSelection {
    /// Keep the tiles closest to the character by Manhattan distance.
    #[default]
    Nearest,
    /// Shuffle with a per-character seeded generator, then keep a prefix.
    Seeded,
}

/// Translator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MovementConfig {
    /// Address used when an activity's site resolves to no tiles.
    #[serde(default = "default_site")]
    pub default_site: String,

    /// Starting tile for characters without runtime state.
    #[serde(default)]
    pub spawn_tile: Option<Tile>,

    /// Offset of the simulation's local time from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Candidate target selection strategy.
    #[serde(default)]
    pub target_selection: TargetSelection,

    /// Seed for [`TargetSelection::Seeded`].
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of candidate target tiles handed to the path finder.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            default_site: default_site(),
            spawn_tile: None,
            utc_offset_minutes: 0,
            target_selection: TargetSelection::default(),
            seed: default_seed(),
            max_candidates: default_max_candidates(),
        }
    }
}

/// Periodic job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobsConfig {
    /// Real-time milliseconds between position advances.
    #[serde(default = "default_advance_interval_ms")]
    pub advance_interval_ms: u64,

    /// Real-time milliseconds between schedule translations.
    #[serde(default = "default_translate_interval_ms")]
    pub translate_interval_ms: u64,

    /// Characters processed concurrently within one batch.
    #[serde(default = "default_worker_limit")]
    pub worker_limit: usize,

    /// Milliseconds to wait for a schedule before skipping the character.
    #[serde(default = "default_schedule_fetch_timeout_ms")]
    pub schedule_fetch_timeout_ms: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            advance_interval_ms: default_advance_interval_ms(),
            translate_interval_ms: default_translate_interval_ms(),
            worker_limit: default_worker_limit(),
            schedule_fetch_timeout_ms: default_schedule_fetch_timeout_ms(),
        }
    }
}

/// Which [`StateStore`](persona_db::StateStore) backs the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// In-process store; state is lost on exit.
    #[default]
    Memory,
    /// Shared `Dragonfly` instance.
    Dragonfly,
}

/// Infrastructure configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// Store backend.
    #[serde(default)]
    pub store: StoreKind,

    /// Dragonfly (Redis-compatible) URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// JSON file of daily schedules keyed by character id.
    #[serde(default)]
    pub schedules_file: Option<PathBuf>,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            dragonfly_url: default_dragonfly_url(),
            schedules_file: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is
    /// unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_map_dir() -> PathBuf {
    PathBuf::from("assets/the_ville")
}

fn default_site() -> String {
    "the Ville:Johnson Park".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_candidates() -> usize {
    4
}

const fn default_advance_interval_ms() -> u64 {
    5000
}

const fn default_translate_interval_ms() -> u64 {
    60_000
}

const fn default_worker_limit() -> usize {
    8
}

const fn default_schedule_fetch_timeout_ms() -> u64 {
    2000
}

fn default_dragonfly_url() -> String {
    "redis://localhost:6379".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PersonaConfig::default();
        assert_eq!(config.jobs.advance_interval_ms, 5000);
        assert_eq!(config.jobs.translate_interval_ms, 60_000);
        assert_eq!(config.jobs.worker_limit, 8);
        assert_eq!(config.movement.target_selection, TargetSelection::Nearest);
        assert_eq!(config.movement.max_candidates, 4);
        assert_eq!(config.infrastructure.store, StoreKind::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
map:
  dir: "/srv/maps/the_ville"
  collision_block_id: 1

movement:
  default_site: "the Ville:Hobbs Cafe"
  spawn_tile: { x: 72, y: 14 }
  utc_offset_minutes: -300
  target_selection: seeded
  seed: 7
  max_candidates: 2

jobs:
  advance_interval_ms: 1000
  translate_interval_ms: 30000
  worker_limit: 4
  schedule_fetch_timeout_ms: 500

infrastructure:
  store: dragonfly
  dragonfly_url: "redis://testhost:6379"
  schedules_file: "schedules.json"

logging:
  level: "debug"
  json: true
"#;

        let config = PersonaConfig::parse(yaml).unwrap();
        assert_eq!(config.map.collision_block_id, Some(1));
        assert_eq!(config.movement.default_site, "the Ville:Hobbs Cafe");
        assert_eq!(config.movement.spawn_tile, Some(Tile::new(72, 14)));
        assert_eq!(config.movement.utc_offset_minutes, -300);
        assert_eq!(config.movement.target_selection, TargetSelection::Seeded);
        assert_eq!(config.jobs.worker_limit, 4);
        assert_eq!(config.infrastructure.store, StoreKind::Dragonfly);
        assert_eq!(
            config.infrastructure.schedules_file,
            Some(PathBuf::from("schedules.json"))
        );
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = PersonaConfig::parse("movement:\n  seed: 9\n").unwrap();

        // Seed is overridden
        assert_eq!(config.movement.seed, 9);
        // Everything else uses defaults
        assert_eq!(config.movement.max_candidates, 4);
        assert_eq!(config.jobs.advance_interval_ms, 5000);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(PersonaConfig::parse("").is_ok());
    }

    #[test]
    fn zero_worker_limit_is_rejected() {
        let err = PersonaConfig::parse("jobs:\n  worker_limit: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "jobs.worker_limit", .. }
        ));
    }

    #[test]
    fn offset_beyond_a_day_is_rejected() {
        let err = PersonaConfig::parse("movement:\n  utc_offset_minutes: 1440\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_selection_is_a_yaml_error() {
        let err = PersonaConfig::parse("movement:\n  target_selection: random\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("persona-config.yaml");
        if path.exists() {
            let config = PersonaConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
