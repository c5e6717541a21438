//! Periodic job runner.
//!
//! Drives the two independent jobs of the movement core:
//!
//! - **Advance**: every `advance_interval_ms`, move every character along
//!   its stored path.
//! - **Translate**: every `translate_interval_ms`, turn each character's
//!   current activity into a path when the stored one no longer serves it.
//!
//! Each job runs in its own task on a [`tokio::time::interval`] with
//! [`MissedTickBehavior::Skip`]; a batch is awaited before the next tick is
//! taken, so a job never overlaps itself. The two jobs coordinate through
//! the per-character locks inside [`MovementService`]. Both honor
//! [`JobControl`] pause and stop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::JobsConfig;
use crate::control::JobControl;
use crate::service::{BatchReport, MovementService};

/// Errors that can occur while running the jobs.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A job task panicked or was aborted.
    #[error("{job} job task failed: {source}")]
    Join {
        /// Which job.
        job: &'static str,
        /// The underlying join error.
        source: tokio::task::JoinError,
    },
}

/// Which batch a job loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// [`MovementService::advance_all_positions`].
    Advance,
    /// [`MovementService::resolve_all_paths`].
    Translate,
}

impl Job {
    /// Name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Advance => "advance",
            Self::Translate => "translate",
        }
    }

    async fn run_batch(self, service: &MovementService) -> BatchReport {
        match self {
            Self::Advance => service.advance_all_positions().await,
            Self::Translate => service.resolve_all_paths().await,
        }
    }
}

/// Totals accumulated by one job loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStats {
    /// Batches completed.
    pub runs: u64,
    /// Sum of [`BatchReport::updated`].
    pub updated: u64,
    /// Sum of [`BatchReport::errors`].
    pub errors: u64,
}

impl JobStats {
    fn absorb(&mut self, report: &BatchReport) {
        self.runs = self.runs.saturating_add(1);
        self.updated = self
            .updated
            .saturating_add(u64::try_from(report.updated).unwrap_or(u64::MAX));
        self.errors = self
            .errors
            .saturating_add(u64::try_from(report.errors).unwrap_or(u64::MAX));
    }
}

/// Result of [`run_jobs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Advance job totals.
    pub advance: JobStats,
    /// Translate job totals.
    pub translate: JobStats,
}

/// Run one job until a stop is requested.
///
/// The first batch runs immediately.
pub async fn run_job(
    job: Job,
    service: Arc<MovementService>,
    control: Arc<JobControl>,
    interval_ms: u64,
) -> JobStats {
    let mut stats = JobStats::default();
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(job = job.name(), interval_ms, "job starting");

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            () = control.stopped() => break,
        }

        // --- Check pause ---
        if control.is_paused() {
            info!(job = job.name(), "job paused, waiting for resume...");
            control.wait_if_paused().await;
            info!(job = job.name(), "job resumed");
        }

        // --- Check stop request (before batch) ---
        if control.is_stop_requested() {
            break;
        }

        let started = tokio::time::Instant::now();
        let report = job.run_batch(&service).await;
        stats.absorb(&report);
        let batch = control.record_batch();

        if report.errors > 0 {
            warn!(
                job = job.name(),
                batch,
                updated = report.updated,
                total = report.total,
                skipped = report.skipped,
                errors = report.errors,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "batch finished with errors"
            );
        } else {
            info!(
                job = job.name(),
                batch,
                updated = report.updated,
                total = report.total,
                skipped = report.skipped,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "batch finished"
            );
        }
    }

    info!(
        job = job.name(),
        runs = stats.runs,
        updated = stats.updated,
        errors = stats.errors,
        "job stopped"
    );
    stats
}

/// Run the advance and translate jobs until a stop is requested.
///
/// # Errors
///
/// Returns [`RunnerError::Join`] if either job task panics.
pub async fn run_jobs(
    service: Arc<MovementService>,
    control: Arc<JobControl>,
    jobs: &JobsConfig,
) -> Result<RunSummary, RunnerError> {
    let translate = tokio::spawn(run_job(
        Job::Translate,
        Arc::clone(&service),
        Arc::clone(&control),
        jobs.translate_interval_ms,
    ));
    let advance = tokio::spawn(run_job(
        Job::Advance,
        service,
        control,
        jobs.advance_interval_ms,
    ));

    let translate = translate.await.map_err(|source| RunnerError::Join {
        job: Job::Translate.name(),
        source,
    })?;
    let advance = advance.await.map_err(|source| RunnerError::Join {
        job: Job::Advance.name(),
        source,
    })?;
    Ok(RunSummary { advance, translate })
}
