//! Rate-limited fan-out notifier (spec §4.9).
//!
//! Grounded in the teacher's `notifications` null-object pattern
//! (`NilNotifier`-shaped no-op) and its multi-backend dispatch shape in
//! `sse/notifications.rs`; the token-bucket rate limiting and bounded HTTP
//! dispatch are new, built on `governor` and `reqwest` the way the pack's
//! `QCK-SH-qck-backend-core` example reaches for `governor` for exactly
//! this purpose.

/// Discord webhook backend.
pub mod discord;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The kind of event being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// An operator-actionable alarm.
    Alarm,
    /// A non-actionable metric/observation.
    Metric,
}

/// One fan-out notification (spec §4.9).
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Alarm or metric.
    pub notification_type: NotificationType,
    /// Subsystem that raised the notification, e.g. `"scheduler"`.
    pub source: String,
    /// Human-readable message.
    pub message: String,
    /// Free-form structured fields.
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Notification {
    /// Builds an [`NotificationType::Alarm`] notification with no extra
    /// fields.
    #[must_use]
    pub fn alarm(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            notification_type: NotificationType::Alarm,
            source: source.into(),
            message: message.into(),
            fields: serde_json::Map::new(),
        }
    }
}

/// A fan-out destination. Implementors must not block the caller: a
/// backend that wants to make an HTTP call detaches a task and enforces
/// its own rate limit and timeout (spec §4.9b/c).
#[async_trait::async_trait]
pub trait Notify: Send + Sync {
    /// Dispatches `notification`. Backends never propagate a transient
    /// delivery failure as a hard error to the caller; only a
    /// misconfiguration (e.g. malformed webhook URL) should.
    ///
    /// # Errors
    /// Returns an error only when the backend is unusable in a way the
    /// caller should know about immediately.
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// The identity notifier: does nothing. Backs local/dev runs that have no
/// webhook configured (spec §4.9 `NilNotifier`).
pub struct NilNotifier;

#[async_trait::async_trait]
impl Notify for NilNotifier {
    async fn send(&self, _notification: &Notification) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Holds an ordered list of backends and dispatches to each sequentially,
/// short-circuiting and returning the first error (spec §4.9
/// `MultiNotifier`).
pub struct MultiNotifier {
    backends: Vec<Box<dyn Notify>>,
}

impl MultiNotifier {
    /// Builds a multi-notifier from a fixed backend list. An empty list
    /// behaves like [`NilNotifier`].
    #[must_use]
    pub fn new(backends: Vec<Box<dyn Notify>>) -> Self {
        Self { backends }
    }
}

#[async_trait::async_trait]
impl Notify for MultiNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        for backend in &self.backends {
            backend.send(notification).await?;
        }
        Ok(())
    }
}
