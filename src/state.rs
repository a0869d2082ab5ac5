//! Shared application state (SPEC_FULL.md §4.10), generalized from the
//! teacher's `AuthContext`/`DataContext`/`ConfigContext` context-splitting
//! pattern (`src/context/`) into a single `AppState` handed to every
//! handler through axum's `State` extractor.

use std::sync::Arc;

use crate::config::ConfigProvider;
use crate::crypto::SecureStore;
use crate::database::Database;
use crate::mailer::Mailer;
use crate::middleware::block_list::BlockList;
use crate::middleware::metrics::Metrics;
use crate::notifier::Notify;

/// Everything a handler needs: database, config, job queue (via
/// `db.jobs()`), mailer, notifier, block-list, and metrics. Cheap to
/// clone — every field is an `Arc` or an internally-`Arc`-backed handle.
#[derive(Clone)]
pub struct AppState {
    /// Typed SQLite access.
    pub db: Database,
    /// Hot-reloadable application config.
    pub config: Arc<ConfigProvider>,
    /// Age-encrypted config blob store, for the admin reload path.
    pub secure_store: Arc<SecureStore>,
    /// Outbound mail.
    pub mailer: Arc<dyn Mailer>,
    /// Alarm/metric fan-out.
    pub notifier: Arc<dyn Notify>,
    /// Blocked IP/user-id gate.
    pub block_list: Arc<BlockList>,
    /// Prometheus counters/histograms.
    pub metrics: Arc<Metrics>,
}
