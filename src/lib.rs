#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # auth-backend
//!
//! A self-contained authentication and background-work backend over an
//! embedded SQLite database: registration and login with email/password,
//! OAuth2 login, email verification, password reset, email change, and a
//! job queue that drives the asynchronous side effects (mailing) those
//! flows require.
//!
//! ## Architecture
//!
//! - [`crypto`] — password hashing, per-user JWT signing-key derivation,
//!   token mint/verify, PKCE, and the age-encrypted config blob store
//! - [`auth`] — the request-time authenticator that turns a bearer token
//!   into an [`models::User`]
//! - [`database`] — the SQLite data layer: users, job queue, config blobs,
//!   ACME certificates
//! - [`jobs`] — job payloads, registered handlers, the dispatch executor,
//!   and the periodic scheduler that drains the queue
//! - [`config`] — the bootstrap layer and the hot-reloadable application
//!   configuration
//! - [`handlers`] — one module per HTTP endpoint group
//! - [`app`] — assembles the full router from every handler group
//! - [`mailer`], [`notifier`] — outbound email and alarm fan-out
//! - [`middleware`] — block-list gate, response recorder, metrics
//!
//! See `src/bin/server.rs` and `src/bin/admin.rs` for the two binaries
//! built on top of this library.

/// The request-time authenticator (bearer token -> [`models::User`]).
pub mod auth;
/// Bootstrap configuration and the hot-reloadable application config.
pub mod config;
/// Application constants grouped by concern.
pub mod constants;
/// Password hashing, JWT signing, PKCE, and the encrypted config store.
pub mod crypto;
/// The SQLite data layer.
pub mod database;
/// Error taxonomy and the precomputed response catalog.
pub mod errors;
/// The validated-JSON request extractor.
pub mod extract;
/// HTTP handlers, one module per endpoint group.
pub mod handlers;
/// Job payloads, handlers, executor, and scheduler.
pub mod jobs;
/// Structured logging setup.
pub mod logging;
/// Outbound mail.
pub mod mailer;
/// HTTP middleware: block-list gate, response recorder, metrics.
pub mod middleware;
/// Common data models.
pub mod models;
/// Rate-limited fan-out notifier.
pub mod notifier;
/// OAuth2 authorization-code client.
pub mod oauth2;
/// Shared application state.
pub mod state;
/// Field-format checks shared by every handler.
pub mod validation;

/// Assembles the full HTTP router.
pub mod app;
