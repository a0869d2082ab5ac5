//! Structured logging setup (ambient stack; SPEC_FULL.md §0).
//!
//! Grounded in the teacher's `logging::LoggingConfig`/`LogFormat`/`init()`
//! pattern (env-filter noise reduction + a JSON/pretty/compact `fmt` layer
//! choice); narrowed to drop the teacher's tenant-context and MCP-specific
//! helpers, since this backend has neither concept.

use std::env;
use std::io;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON lines, for production ingestion.
    Json,
    /// Human-readable, for local development.
    Pretty,
    /// Compact one-line-per-event, for constrained terminals.
    Compact,
}

/// Logging configuration resolved once at startup from the bootstrap
/// [`crate::config::LogLevel`] and the environment.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"info"`.
    pub level: String,
    /// Output layout.
    pub format: LogFormat,
    /// Include source file and line number in each event.
    pub include_location: bool,
}

impl LoggingConfig {
    /// Builds a configuration from a resolved [`crate::config::LogLevel`]
    /// and the `LOG_FORMAT` environment variable (`json`, `compact`,
    /// anything else falls back to pretty).
    #[must_use]
    pub fn from_level(level: crate::config::LogLevel) -> Self {
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        Self {
            level: level.as_tracing_directive().to_string(),
            format,
            include_location: env::var("LOG_INCLUDE_LOCATION").is_ok(),
        }
    }

    /// Initializes the global `tracing` subscriber.
    ///
    /// # Errors
    /// Returns an error if a subscriber has already been installed, or if
    /// a filter directive fails to parse (the latter never happens with a
    /// [`crate::config::LogLevel`]-derived level).
    pub fn init(&self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.level))
            .add_directive("hyper=warn".parse()?)
            .add_directive("reqwest=warn".parse()?)
            .add_directive("sqlx=warn".parse()?)
            .add_directive("tower_http=info".parse()?)
            .add_directive(format!("auth_backend={}", self.level).parse()?);

        let registry = tracing_subscriber::registry().with(env_filter);

        match self.format {
            LogFormat::Json => {
                let layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE)
                    .json();
                registry.with(layer).try_init()?;
            }
            LogFormat::Pretty => {
                let layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE);
                registry.with(layer).try_init()?;
            }
            LogFormat::Compact => {
                let layer = fmt::layer()
                    .compact()
                    .with_file(false)
                    .with_line_number(false)
                    .with_target(false)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE);
                registry.with(layer).try_init()?;
            }
        }

        info!(log.level = %self.level, log.format = ?self.format, "auth-backend starting up");
        Ok(())
    }
}

/// Logs a single structured authentication event (success or failure).
pub fn log_auth_event(user_id: &str, event: &str, success: bool) {
    info!(user.id = %user_id, auth.event = %event, auth.success = %success, "authentication event");
}

/// Logs a completed HTTP request; called by the response-recorder
/// middleware (SPEC_FULL.md §4.12), not by individual handlers.
pub fn log_api_request(method: &str, path: &str, status: u16, duration_ms: u128, bytes: usize) {
    info!(
        http.method = %method,
        http.path = %path,
        http.status = %status,
        http.duration_ms = %duration_ms,
        http.response_bytes = %bytes,
        "http request"
    );
}

/// Logs a security-relevant event at `warn` level (e.g. a dropped
/// notification, a blocked request).
pub fn log_security_event(event_type: &str, details: &str) {
    warn!(security.event = %event_type, security.details = %details, "security event");
}
