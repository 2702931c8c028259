//! Polling scheduler
//!
//! Hosts the engine's tick loop in polling mode: a single worker drives
//! one tick per interval, skips ticks that would overlap a slow one, and
//! tracks a consecutive-error counter for health reporting. The
//! low-frequency cleanup sweep runs as a cron job beside it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use application::ports::ReminderStorePort;
use application::services::ReminderEngine;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, error, info};

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Invalid cron expression
    #[error("Invalid cron expression: {0}")]
    InvalidCronExpression(String),

    /// Scheduler failed to start
    #[error("Scheduler failed to start: {0}")]
    StartupFailed(String),

    /// Internal scheduler error
    #[error("Internal scheduler error: {0}")]
    Internal(String),
}

impl From<JobSchedulerError> for SchedulerError {
    fn from(err: JobSchedulerError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Health snapshot of the polling loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Ticks completed since start
    pub ticks_run: u64,
    /// Ticks failed in a row; resets to zero on every successful tick
    pub consecutive_errors: u32,
}

/// Cloneable handle onto the loop's health counters
///
/// Lets the readiness endpoint observe the scheduler without owning it.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStatsHandle {
    ticks_run: Arc<AtomicU64>,
    consecutive_errors: Arc<AtomicU32>,
}

impl SchedulerStatsHandle {
    /// Read the current counters
    #[must_use]
    pub fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            ticks_run: self.ticks_run.load(Ordering::Relaxed),
            consecutive_errors: self.consecutive_errors.load(Ordering::Relaxed),
        }
    }
}

/// Drives the engine's tick loop at a fixed cadence
///
/// Only one tick executes at a time; if a tick overruns the interval the
/// missed firings are skipped, not queued. Stopping is graceful: an
/// in-progress tick finishes, then no new ticks start.
pub struct PollingScheduler<S> {
    engine: Arc<ReminderEngine<S>>,
    tick_interval: Duration,
    stats: SchedulerStatsHandle,
    stop: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl<S> std::fmt::Debug for PollingScheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingScheduler")
            .field("tick_interval", &self.tick_interval)
            .field("running", &self.stop.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: ReminderStorePort + 'static> PollingScheduler<S> {
    /// Create a scheduler over the engine
    #[must_use]
    pub fn new(engine: Arc<ReminderEngine<S>>, tick_interval: Duration) -> Self {
        Self {
            engine,
            tick_interval,
            stats: SchedulerStatsHandle::default(),
            stop: None,
            handle: None,
        }
    }

    /// Whether the loop is currently running
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.stop.is_some()
    }

    /// Current health counters
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.stats.snapshot()
    }

    /// Cloneable handle for external health reporting
    #[must_use]
    pub fn stats_handle(&self) -> SchedulerStatsHandle {
        self.stats.clone()
    }

    /// Start the tick loop
    pub fn start(&mut self) {
        if self.stop.is_some() {
            debug!("Polling scheduler already running");
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        self.stop = Some(tx);

        let engine = Arc::clone(&self.engine);
        let ticks_run = Arc::clone(&self.stats.ticks_run);
        let consecutive_errors = Arc::clone(&self.stats.consecutive_errors);
        let interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Overlap prevention: a slow tick swallows the missed firings
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match engine.run_tick().await {
                            Ok(summary) => {
                                ticks_run.fetch_add(1, Ordering::Relaxed);
                                consecutive_errors.store(0, Ordering::Relaxed);
                                if summary.fired > 0 || summary.deactivated > 0 {
                                    info!(
                                        checked = summary.checked,
                                        fired = summary.fired,
                                        deactivated = summary.deactivated,
                                        "Tick processed reminders"
                                    );
                                }
                            },
                            Err(e) => {
                                let failures =
                                    consecutive_errors.fetch_add(1, Ordering::Relaxed) + 1;
                                error!(error = %e, consecutive = failures, "Tick failed");
                            },
                        }
                    }
                    _ = rx.changed() => {
                        if *rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Polling loop stopped");
        });
        self.handle = Some(handle);

        info!(interval_ms = interval.as_millis() as u64, "Polling scheduler started");
    }

    /// Stop the loop, letting an in-progress tick finish
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Polling scheduler stopped");
    }
}

/// Install the cleanup sweep as a cron job and start its scheduler
///
/// The returned `JobScheduler` owns the job; call `shutdown` on it when
/// the process stops.
pub async fn spawn_cleanup_job<S: ReminderStorePort + 'static>(
    engine: Arc<ReminderEngine<S>>,
    cron_expression: &str,
) -> Result<JobScheduler, SchedulerError> {
    cron_expression
        .parse::<cron::Schedule>()
        .map_err(|e| SchedulerError::InvalidCronExpression(format!("{cron_expression}: {e}")))?;

    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(cron_expression, move |_uuid, _lock| {
        let engine = Arc::clone(&engine);
        Box::pin(async move {
            match engine.cleanup_sweep().await {
                Ok(summary) => {
                    info!(
                        checked = summary.checked,
                        deactivated = summary.deactivated,
                        "Scheduled cleanup sweep finished"
                    );
                },
                Err(e) => {
                    error!(error = %e, "Scheduled cleanup sweep failed");
                },
            }
        })
    })
    .map_err(|e| SchedulerError::InvalidCronExpression(e.to_string()))?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!(cron = cron_expression, "Cleanup job scheduled");
    Ok(scheduler)
}
