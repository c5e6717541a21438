//! Movement engine binary for the persona town.
//!
//! Loads configuration, the tile map, the state store, and the daily
//! schedules, then runs the translate and advance jobs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Resolve the config path (argument, `PERSONA_CONFIG`, or
//!    `persona-config.yaml`) and load it
//! 2. Initialize structured logging (tracing)
//! 3. Load the map and build the address index
//! 4. Connect the state store and register scheduled characters
//! 5. Run the jobs; Ctrl-C requests a stop
//! 6. Log the result

mod error;
mod setup;

use std::sync::Arc;

use persona_core::control::JobControl;
use persona_core::runner;
use tracing::{info, warn};

/// Application entry point for the movement engine.
///
/// # Errors
///
/// Returns an error if any initialization step or a job task fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let path = setup::config_path(
        std::env::args().nth(1),
        std::env::var("PERSONA_CONFIG").ok(),
    );
    let config = setup::load_config(&path)?;

    // 2. Initialize structured logging.
    setup::init_tracing(&config.logging)?;
    info!(
        config = %path.display(),
        map_dir = %config.map.dir.display(),
        store = ?config.infrastructure.store,
        advance_interval_ms = config.jobs.advance_interval_ms,
        translate_interval_ms = config.jobs.translate_interval_ms,
        worker_limit = config.jobs.worker_limit,
        "persona-engine starting"
    );

    // 3-4. Map, store, schedules.
    let control = Arc::new(JobControl::new());
    let service = setup::build_service(&config, Arc::clone(&control)).await?;

    // 5. Stop on Ctrl-C.
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                return;
            }
            info!("Ctrl-C received, stopping jobs");
            control.request_stop();
        });
    }

    let summary = runner::run_jobs(service, Arc::clone(&control), &config.jobs)
        .await
        .map_err(error::EngineError::from)?;

    // 6. Log results.
    info!(
        advance_runs = summary.advance.runs,
        positions_written = summary.advance.updated,
        advance_errors = summary.advance.errors,
        translate_runs = summary.translate.runs,
        paths_written = summary.translate.updated,
        translate_errors = summary.translate.errors,
        uptime_seconds = control.elapsed_seconds(),
        "persona-engine shutdown complete"
    );

    Ok(())
}
