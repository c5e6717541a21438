//! Shared control state for the periodic jobs.
//!
//! The job loops and the batch fan-out poll these flags between
//! characters; the engine flips them from its signal handler. All fields
//! are atomics or [`Notify`] so the hot path never takes a lock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

/// Pause, resume, and stop control shared by every job.
#[derive(Debug)]
pub struct JobControl {
    /// Whether the jobs are currently paused.
    paused: AtomicBool,

    /// Notification used to wake job loops when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Notification used to wake job loops waiting for their next tick.
    stop_notify: Notify,

    /// Number of completed batch runs across all jobs.
    batches: AtomicU64,

    /// Wall-clock time when the jobs started.
    started_at: DateTime<Utc>,
}

impl Default for JobControl {
    fn default() -> Self {
        Self::new()
    }
}

impl JobControl {
    /// Create a running, unpaused control.
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            batches: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the jobs are paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the jobs. Loops sleep until resumed; a batch already running
    /// finishes.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the jobs and wake every paused loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_waiters();
    }

    /// Wait until the jobs are no longer paused or a stop is requested.
    pub async fn wait_if_paused(&self) {
        loop {
            let resumed = self.resume_notify.notified();
            let stopped = self.stop_notify.notified();
            if !self.is_paused() || self.is_stop_requested() {
                return;
            }
            tokio::select! {
                () = resumed => {}
                () = stopped => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop and wake every waiting loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        loop {
            let notified = self.stop_notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    /// Record one completed batch.
    pub fn record_batch(&self) -> u64 {
        self.batches.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    /// Number of completed batches.
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Acquire)
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}
