//! Job queue consumers: typed payloads, registered handlers, the
//! dispatch-by-type executor, and the periodic scheduler (spec §4.5-4.7).
//!
//! The storage layer itself lives in [`crate::database::jobs`]; this
//! module is everything that *drains* the queue.

use std::sync::Arc;

use crate::config::ConfigProvider;
use crate::database::Database;
use crate::mailer::Mailer;

/// Job payload/payload-extra shapes, one per registered job type.
pub mod payloads;
/// The three registered job handlers.
pub mod handlers;
/// Dispatch-by-type-tag executor.
pub mod executor;
/// Periodic tick/claim/dispatch loop.
pub mod scheduler;

pub use executor::Executor;
pub use scheduler::Scheduler;

/// Collaborators a job handler needs: the database, the live config
/// (fetched fresh per job via [`ConfigProvider::get`]), and the mailer.
#[derive(Clone)]
pub struct HandlerContext {
    /// Typed database access.
    pub db: Database,
    /// Hot-reloadable application config.
    pub config: Arc<ConfigProvider>,
    /// Outbound mail.
    pub mailer: Arc<dyn Mailer>,
}
