//! # Poll Scheduler
//!
//! Pulls queued jobs from the backend on a fixed interval and prints them
//! one after another.
//!
//! ## Cycle
//!
//! ```text
//! tick ─► running? ── yes ──► drop tick
//!            │
//!            no
//!            ▼
//!   fetch pending ── error ──► log, back to idle
//!            │
//!            ▼
//!   for each job: dispatch ─► report status
//!            │
//!            ▼
//!          idle
//! ```
//!
//! At most one cycle runs at a time. A tick that fires mid-cycle is dropped,
//! not queued. Jobs within a cycle are dispatched sequentially so two jobs
//! never contend for the same printer. There is no backoff: the interval is
//! the retry interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::backend::JobBackend;
use crate::dispatch::JobDispatcher;
use crate::display::{DisplayEvent, DisplayHub};

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another cycle was running; nothing was fetched
    Skipped,
    /// Fetched an empty batch
    Idle,
    /// Dispatched a batch
    Processed { completed: usize, failed: usize },
    /// The backend could not be reached or answered garbage
    FetchFailed,
}

/// Clears the running flag when the cycle ends, including by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-flight polling loop over a [`JobBackend`].
pub struct PollScheduler {
    backend: Arc<dyn JobBackend>,
    dispatcher: Arc<JobDispatcher>,
    interval: Duration,
    display: Option<DisplayHub>,
    alert_sound: bool,
    running: AtomicBool,
}

impl PollScheduler {
    pub fn new(
        backend: Arc<dyn JobBackend>,
        dispatcher: Arc<JobDispatcher>,
        interval: Duration,
    ) -> Self {
        Self {
            backend,
            dispatcher,
            interval,
            display: None,
            alert_sound: false,
            running: AtomicBool::new(false),
        }
    }

    /// Notify customer screens of job outcomes, and of alerts when enabled.
    pub fn with_display(mut self, display: DisplayHub, alert_sound: bool) -> Self {
        self.display = Some(display);
        self.alert_sound = alert_sound;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one poll cycle unless one is already in flight.
    pub async fn tick(&self) -> TickOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("already processing jobs, skipping this interval");
            return TickOutcome::Skipped;
        }
        let _guard = RunningGuard(&self.running);

        debug!("checking for pending print jobs");
        let batch = match self.backend.fetch_pending().await {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, "error fetching print jobs from backend");
                return TickOutcome::FetchFailed;
            }
        };

        if batch.alert_sound
            && self.alert_sound
            && let Some(display) = &self.display
        {
            info!("backend requested an alert sound");
            display.publish(DisplayEvent::PrintAlert);
        }

        if batch.jobs.is_empty() {
            debug!("no pending print jobs found");
            return TickOutcome::Idle;
        }

        info!(count = batch.jobs.len(), "found pending print jobs");
        let (mut completed, mut failed) = (0, 0);
        for job in &batch.jobs {
            let result = self.dispatcher.dispatch(job).await;
            if result.is_completed() {
                completed += 1;
            } else {
                failed += 1;
            }

            match self.backend.report_status(&job.id, &result.to_update()).await {
                Ok(()) => info!(job = %job, status = %result.status(), "updated job status"),
                Err(e) => error!(job = %job, error = %e, "error updating job status on backend"),
            }

            if let Some(display) = &self.display {
                display.publish(DisplayEvent::print_status(job, &result));
            }
        }

        info!(completed, failed, "finished processing print jobs");
        TickOutcome::Processed { completed, failed }
    }

    /// Tick immediately, then once per interval, forever.
    ///
    /// Each tick runs on its own task so a tick landing during a long cycle
    /// reaches [`tick`](Self::tick) and is dropped there. A panicking cycle is
    /// logged and the loop carries on.
    pub async fn run(self: Arc<Self>) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "starting backend polling"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let scheduler = Arc::clone(&self);
            let cycle = tokio::spawn(async move { scheduler.tick().await });
            tokio::spawn(async move {
                if let Err(e) = cycle.await {
                    error!(error = %e, "poll cycle aborted");
                }
            });
        }
    }

    /// Start [`run`](Self::run) in the background.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
