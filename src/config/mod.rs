//! Configuration: a small, typed bootstrap layer (environment/CLI derived,
//! needed before any database access is possible) plus the hot-reloadable,
//! age-encrypted application [`Config`] (spec §4.8).
//!
//! The bootstrap layer follows the teacher's `config::environment` pattern
//! (typed enums parsed from strings with a safe default); everything past
//! that point — JWT secrets/TTLs, SMTP, OAuth2 providers, notifier
//! webhooks, rate-limit durations — lives only in the encrypted blob.

/// Bootstrap configuration: age identity path, database path, bind
/// address, initial log level.
pub mod environment;
/// Hot-reloadable application configuration and its atomic-pointer
/// provider.
pub mod provider;

pub use environment::{Bootstrap, LogLevel};
pub use provider::{Config, ConfigProvider};
