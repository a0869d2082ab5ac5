//! The hot-reloadable application configuration (spec §4.8).
//!
//! `ConfigProvider` holds one `ArcSwap<Config>`. `get()` is lock-free;
//! `reload()` decrypts the latest `app`-scope blob via
//! [`crate::crypto::SecureStore`], parses it as TOML, and swaps the
//! pointer. Every handler calls `provider.get()` at the point of use and
//! never caches the result past a single request, so a swap takes effect
//! on the very next request with no locking on the read side (spec: "no
//! reader ever observes a torn config").

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;

use crate::constants::{config_scope, cooldowns, jwt_ttl};
use crate::crypto::SecureStore;
use crate::errors::AppError;

/// Per-type JWT secrets and TTLs (spec §6: "TTLs and secrets are per-type
/// in config").
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Signing domain secret for session tokens; must be >= 32 bytes.
    pub session_secret: String,
    /// Signing domain secret for email-verification tokens.
    pub verification_email_secret: String,
    /// Signing domain secret for password-reset tokens.
    pub password_reset_secret: String,
    /// Signing domain secret for email-change tokens.
    pub email_change_secret: String,
    /// Session token TTL in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,
    /// Email-verification token TTL in seconds.
    #[serde(default = "default_email_verification_ttl")]
    pub email_verification_ttl_secs: i64,
    /// Password-reset token TTL in seconds.
    #[serde(default = "default_password_reset_ttl")]
    pub password_reset_ttl_secs: i64,
    /// Email-change token TTL in seconds.
    #[serde(default = "default_email_change_ttl")]
    pub email_change_ttl_secs: i64,
}

const fn default_session_ttl() -> i64 {
    jwt_ttl::SESSION_SECS
}
const fn default_email_verification_ttl() -> i64 {
    jwt_ttl::EMAIL_VERIFICATION_SECS
}
const fn default_password_reset_ttl() -> i64 {
    jwt_ttl::PASSWORD_RESET_SECS
}
const fn default_email_change_ttl() -> i64 {
    jwt_ttl::EMAIL_CHANGE_SECS
}

/// Per-action rate-limit (cooldown bucket) durations.
#[derive(Debug, Clone, Deserialize)]
pub struct CooldownConfig {
    /// `email-verification-cooldown`, in seconds.
    #[serde(default = "default_email_verification_cooldown")]
    pub email_verification_secs: i64,
    /// `password-reset-cooldown`, in seconds.
    #[serde(default = "default_password_reset_cooldown")]
    pub password_reset_secs: i64,
    /// `email-change-cooldown`, in seconds.
    #[serde(default = "default_email_change_cooldown")]
    pub email_change_secs: i64,
}

const fn default_email_verification_cooldown() -> i64 {
    cooldowns::EMAIL_VERIFICATION_SECS
}
const fn default_password_reset_cooldown() -> i64 {
    cooldowns::PASSWORD_RESET_SECS
}
const fn default_email_change_cooldown() -> i64 {
    cooldowns::EMAIL_CHANGE_SECS
}

/// SMTP credentials for the mailer. Absent entirely selects the
/// `NoopMailer` fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// `From` address used on outgoing mail.
    pub from_address: String,
}

/// One configured OAuth2 provider entry (spec §4.4
/// `GET /list-oauth2-providers`).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2ProviderConfig {
    /// Stable provider key, e.g. `"google"`.
    pub name: String,
    /// Human-readable label.
    pub display_name: String,
    /// OAuth2 client id.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Provider authorization endpoint.
    pub auth_url: String,
    /// Provider token endpoint.
    pub token_url: String,
    /// Provider user-info endpoint, used to map the authenticated email.
    pub user_info_url: String,
    /// Redirect URI registered with the provider.
    pub redirect_uri: String,
    /// Requested scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Whether to generate and advertise a PKCE verifier/challenge.
    #[serde(default)]
    pub use_pkce: bool,
}

/// Notifier fan-out webhook targets.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotifierConfig {
    /// Discord webhook URL; absent disables the Discord backend.
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
}

/// The full decrypted application configuration (spec §6 "plaintext
/// schema").
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server bind address.
    pub bind_addr: String,
    /// JWT secrets and TTLs.
    pub auth: AuthConfig,
    /// Rate-limit cooldown durations.
    #[serde(default = "default_cooldowns")]
    pub cooldowns: CooldownConfig,
    /// SMTP credentials; `None` selects the `NoopMailer`.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    /// Configured OAuth2 providers.
    #[serde(default)]
    pub oauth2_providers: Vec<OAuth2ProviderConfig>,
    /// Notifier webhook targets.
    #[serde(default)]
    pub notifier: NotifierConfig,
}

fn default_cooldowns() -> CooldownConfig {
    CooldownConfig {
        email_verification_secs: cooldowns::EMAIL_VERIFICATION_SECS,
        password_reset_secs: cooldowns::PASSWORD_RESET_SECS,
        email_change_secs: cooldowns::EMAIL_CHANGE_SECS,
    }
}

/// Holds the single atomically-swapped pointer to the active [`Config`].
pub struct ConfigProvider {
    current: ArcSwap<Config>,
}

impl ConfigProvider {
    /// Loads the highest-generation `app`-scope blob via `store`, parses it
    /// as TOML, and installs it as the initial active configuration.
    ///
    /// # Errors
    /// Returns [`AppError`] if no blob exists yet, decryption fails, or the
    /// plaintext does not parse as a valid [`Config`].
    pub async fn load(store: &SecureStore) -> Result<Self, AppError> {
        let config = Self::decrypt_and_parse(store, None).await?;
        Ok(Self {
            current: ArcSwap::from_pointee(config),
        })
    }

    async fn decrypt_and_parse(
        store: &SecureStore,
        generation: Option<i64>,
    ) -> Result<Config, AppError> {
        let (plaintext, format) = store.get(config_scope::APP, generation).await?;
        if format != config_scope::FORMAT_TOML {
            return Err(AppError::new(
                crate::errors::ErrorCode::InternalError,
                format!("unsupported config format {format}"),
            ));
        }
        let text = String::from_utf8(plaintext).map_err(|e| {
            AppError::new(crate::errors::ErrorCode::InternalError, e.to_string())
        })?;
        toml::from_str(&text)
            .map_err(|e| AppError::new(crate::errors::ErrorCode::InternalError, e.to_string()))
    }

    /// Builds a provider from an already-constructed [`Config`], bypassing
    /// [`SecureStore`] entirely. Used by tests that need an
    /// [`AppState`](crate::state::AppState) without an age identity file.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
        }
    }

    /// Lock-free read of the currently active configuration.
    #[must_use]
    pub fn get(&self) -> Arc<Config> {
        self.current.load_full()
    }

    /// Re-decrypts and re-parses the latest `app`-scope blob and swaps it
    /// in. Triggered by a SIGHUP or an administrative reload call (spec
    /// §4.8 "hot reload").
    ///
    /// # Errors
    /// Returns [`AppError`] if the new blob cannot be loaded or parsed;
    /// the previously active configuration is left untouched on failure.
    pub async fn reload(&self, store: &SecureStore) -> Result<(), AppError> {
        let config = Self::decrypt_and_parse(store, None).await?;
        self.current.store(Arc::new(config));
        Ok(())
    }
}
