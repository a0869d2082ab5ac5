//! Bootstrap configuration: the handful of settings that must exist before
//! the encrypted config blob can even be loaded.
//!
//! Grounded in the teacher's `config::environment` typed-enum-with-safe-
//! default pattern (`LogLevel`, `Environment`); narrowed here to only the
//! fields spec §0/§6 actually calls for ("One required environment-
//! equivalent: path to the age identity file. One required startup
//! argument: path to the database file.").

use std::path::PathBuf;

/// Log verbosity, parsed from a string with a safe default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Normal operational logging; the default.
    Info,
    /// Verbose, per-request detail.
    Debug,
    /// Maximally verbose, including library internals.
    Trace,
}

impl LogLevel {
    /// Parses a log level from a string, falling back to [`LogLevel::Info`]
    /// on anything unrecognized rather than failing startup.
    #[must_use]
    pub fn from_str_or_default(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }

    /// The corresponding `tracing` filter directive.
    #[must_use]
    pub const fn as_tracing_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Everything the process needs to know before it can reach the database
/// and decrypt the real application configuration.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    /// Path to the SQLite database file (required positional argument).
    pub database_path: PathBuf,
    /// Path to the age identity file (required `--age-identity` /
    /// `AGE_IDENTITY_PATH`).
    pub age_identity_path: PathBuf,
    /// HTTP bind address used until the first config blob is installed.
    pub bind_addr: String,
    /// Initial log level, overridden by the encrypted config once loaded.
    pub log_level: LogLevel,
}

impl Bootstrap {
    /// The fallback bind address used when `--bind` is not supplied and no
    /// config blob has been installed yet.
    pub const DEFAULT_BIND_ADDR: &'static str = "127.0.0.1:8080";
}
