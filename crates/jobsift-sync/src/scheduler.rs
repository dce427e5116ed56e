//! Cycle scheduler: one delayed first sync, then a recurring interval, with
//! at most one cycle in flight at any time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::coordinator::{SyncCoordinator, SyncSummary};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Delay before the first sync, so a process boot does not sync under load.
    pub initial_delay: Duration,
    pub cleanup_days: u32,
    /// Chance a completed cycle also runs staleness cleanup.
    pub cleanup_probability: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            initial_delay: Duration::from_secs(30),
            cleanup_days: 30,
            cleanup_probability: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    pub timer_active: bool,
    pub sync_in_progress: bool,
    pub next_tick_in: Option<Duration>,
}

struct SchedulerCore {
    coordinator: Arc<SyncCoordinator>,
    config: SchedulerConfig,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SchedulerCore {
    /// One guarded cycle. `None` when a cycle already holds the flag: that
    /// tick is skipped outright, not queued.
    async fn run_cycle(&self) -> Option<SyncSummary> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("sync cycle already in progress; skipping this tick");
            return None;
        }
        // Cleared on every exit path, including panics inside sync_all.
        let _guard = InFlightGuard(&self.in_flight);

        let summary = self.coordinator.sync_all().await;
        info!(
            success = summary.success_count,
            failures = summary.failure_count,
            created = summary.created_total(),
            "sync cycle complete"
        );

        if rand::random::<f64>() < self.config.cleanup_probability {
            match self.coordinator.cleanup_inactive(self.config.cleanup_days).await {
                Ok(affected) => info!(affected, "post-cycle staleness cleanup ran"),
                Err(err) => warn!(error = %err, "post-cycle staleness cleanup failed"),
            }
        }

        Some(summary)
    }
}

/// Two states: stopped (no timer) and running. `start`/`stop` are idempotent;
/// stopping never aborts an in-flight cycle.
pub struct Scheduler {
    core: Arc<SchedulerCore>,
    inner: Mutex<Option<JobScheduler>>,
}

impl Scheduler {
    pub fn new(coordinator: Arc<SyncCoordinator>, config: SchedulerConfig) -> Self {
        Self {
            core: Arc::new(SchedulerCore {
                coordinator,
                config,
                in_flight: AtomicBool::new(false),
            }),
            inner: Mutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.is_some() {
            info!("scheduler already running; start ignored");
            return Ok(());
        }

        let mut sched = JobScheduler::new().await.context("creating scheduler")?;

        let core = Arc::clone(&self.core);
        let first = Job::new_one_shot_async(self.core.config.initial_delay, move |_uuid, _lock| {
            let core = Arc::clone(&core);
            Box::pin(async move {
                // Detached so a later shutdown cannot abort a running cycle.
                tokio::spawn(async move {
                    let _ = core.run_cycle().await;
                });
            })
        })
        .context("creating initial sync job")?;
        sched.add(first).await.context("adding initial sync job")?;

        let core = Arc::clone(&self.core);
        let recurring = Job::new_repeated_async(self.core.config.interval, move |_uuid, _lock| {
            let core = Arc::clone(&core);
            Box::pin(async move {
                tokio::spawn(async move {
                    let _ = core.run_cycle().await;
                });
            })
        })
        .context("creating recurring sync job")?;
        sched.add(recurring).await.context("adding recurring sync job")?;

        sched.start().await.context("starting scheduler")?;
        info!(
            interval_secs = self.core.config.interval.as_secs(),
            initial_delay_secs = self.core.config.initial_delay.as_secs(),
            "scheduler started"
        );
        *inner = Some(sched);
        Ok(())
    }

    /// Cancels future ticks only; an in-flight cycle runs to completion.
    pub async fn stop(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.take() {
            Some(mut sched) => {
                sched.shutdown().await.context("shutting down scheduler")?;
                info!("scheduler stopped");
            }
            None => info!("scheduler already stopped; stop ignored"),
        }
        Ok(())
    }

    pub async fn status(&self) -> SchedulerStatus {
        let mut inner = self.inner.lock().await;
        let next_tick_in = match inner.as_mut() {
            Some(sched) => sched.time_till_next_job().await.ok().flatten(),
            None => None,
        };
        SchedulerStatus {
            timer_active: inner.is_some(),
            sync_in_progress: self.core.in_flight.load(Ordering::SeqCst),
            next_tick_in,
        }
    }

    /// Run one cycle immediately, independent of the timer but under the same
    /// mutual-exclusion flag. `None` means a cycle was already running.
    pub async fn trigger_sync(&self) -> Option<SyncSummary> {
        self.core.run_cycle().await
    }
}
