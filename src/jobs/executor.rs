//! Job dispatch by type tag (spec §4.6).
//!
//! Holds `job_type -> handler` built once at startup. A missing tag is a
//! fatal error: it cannot be retried into existence, so the scheduler
//! marks the job failed with `attempts = max_attempts` immediately rather
//! than burning through retries against a handler that will never exist.

use std::collections::HashMap;

use futures_util::future::BoxFuture;

use super::{handlers, HandlerContext};
use crate::constants::jobs::{TYPE_EMAIL_CHANGE, TYPE_EMAIL_VERIFICATION, TYPE_PASSWORD_RESET};
use crate::models::Job;

type HandlerFn = for<'a> fn(&'a HandlerContext, &'a Job) -> BoxFuture<'a, anyhow::Result<()>>;

/// Result of dispatching one claimed job.
pub enum ExecuteOutcome {
    /// The handler ran to completion.
    Completed,
    /// The handler failed; the job remains retryable up to `max_attempts`.
    Retryable(String),
    /// No handler is registered for this job's type; never retryable.
    Fatal(String),
}

/// Dispatch table for the three registered job types.
pub struct Executor {
    handlers: HashMap<&'static str, HandlerFn>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Builds the dispatch table for `email_verification`, `password_reset`
    /// and `email_change`.
    #[must_use]
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, HandlerFn> = HashMap::new();
        handlers.insert(TYPE_EMAIL_VERIFICATION, |ctx, job| {
            Box::pin(handlers::email_verification(ctx, job))
        });
        handlers.insert(TYPE_PASSWORD_RESET, |ctx, job| {
            Box::pin(handlers::password_reset(ctx, job))
        });
        handlers.insert(TYPE_EMAIL_CHANGE, |ctx, job| {
            Box::pin(handlers::email_change(ctx, job))
        });
        Self { handlers }
    }

    /// Dispatches `job` to the handler registered for its `job_type`.
    pub async fn execute(&self, ctx: &HandlerContext, job: &Job) -> ExecuteOutcome {
        let Some(handler) = self.handlers.get(job.job_type.as_str()) else {
            return ExecuteOutcome::Fatal(format!("no handler registered for job_type {}", job.job_type));
        };
        match handler(ctx, job).await {
            Ok(()) => ExecuteOutcome::Completed,
            Err(err) => ExecuteOutcome::Retryable(err.to_string()),
        }
    }
}
