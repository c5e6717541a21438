//! Engine wiring: config resolution, logging, store and schedule setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use persona_core::config::{InfrastructureConfig, LoggingConfig, PersonaConfig, StoreKind};
use persona_core::control::JobControl;
use persona_core::schedule::{ScheduleSource, StaticScheduleSource};
use persona_core::translator::Translator;
use persona_core::MovementService;
use persona_db::{DragonflyPool, MemoryStore, StateStore};
use persona_world::AddressResolver;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file used when neither an argument nor `PERSONA_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "persona-config.yaml";

/// Pick the config file: first CLI argument, then `PERSONA_CONFIG`, then
/// [`DEFAULT_CONFIG_PATH`].
pub fn config_path(arg: Option<String>, env: Option<String>) -> PathBuf {
    arg.or(env)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the configuration, falling back to defaults when the file is absent.
pub fn load_config(path: &Path) -> Result<PersonaConfig, EngineError> {
    if path.exists() {
        Ok(PersonaConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(PersonaConfig::parse("")?)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log level {:?}: {e}", logging.level),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let result = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Connect the configured state store.
pub async fn build_store(
    infrastructure: &InfrastructureConfig,
) -> Result<Arc<dyn StateStore>, EngineError> {
    match infrastructure.store {
        StoreKind::Memory => {
            info!("Using in-memory state store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::Dragonfly => {
            info!(url = %infrastructure.dragonfly_url, "Connecting to Dragonfly");
            Ok(Arc::new(
                DragonflyPool::connect(&infrastructure.dragonfly_url).await?,
            ))
        }
    }
}

/// Load schedules and register every scheduled character with `store`.
pub async fn build_schedules(
    infrastructure: &InfrastructureConfig,
    store: &dyn StateStore,
) -> Result<Arc<StaticScheduleSource>, EngineError> {
    let source = match &infrastructure.schedules_file {
        Some(path) => StaticScheduleSource::from_file(path)?,
        None => {
            info!("No schedules file configured, starting with no characters");
            StaticScheduleSource::default()
        }
    };
    for id in source.characters().await {
        store.register_character(id).await?;
    }
    Ok(Arc::new(source))
}

/// Assemble the movement service from a loaded config.
pub async fn build_service(
    config: &PersonaConfig,
    control: Arc<JobControl>,
) -> Result<Arc<MovementService>, EngineError> {
    let grid = persona_world::load(&config.map.dir, config.map.collision_block_id)?;
    info!(
        world = grid.world_name(),
        width = grid.width(),
        height = grid.height(),
        passable = grid.passable_count(),
        "Map loaded"
    );
    let resolver = AddressResolver::new(Arc::new(grid));
    info!(addresses = resolver.address_count(), "Address index built");

    let store = build_store(&config.infrastructure).await?;
    let schedules = build_schedules(&config.infrastructure, store.as_ref()).await?;

    Ok(Arc::new(MovementService::new(
        Translator::new(Arc::new(resolver), config.movement.clone()),
        store,
        schedules as Arc<dyn ScheduleSource>,
        control,
        config.jobs.clone(),
        config.movement.utc_offset_minutes,
    )))
}
