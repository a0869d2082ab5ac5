//! Constants used across the authentication and job-queue subsystems.
//!
//! Grouped by domain rather than dumped in one flat file, following the
//! teacher's own move away from a single large constants module.

/// Cryptographic and token constants.
pub mod crypto {
    /// The only JWT signing algorithm this backend accepts.
    pub const JWT_ALGORITHM: &str = "HS256";
    /// Minimum byte length for a domain secret used to derive a signing key.
    pub const MIN_DOMAIN_SECRET_LEN: usize = 32;
    /// Byte length of a derived per-user signing key (HMAC-SHA256 output).
    pub const SIGNING_KEY_LEN: usize = 32;
    /// Minimum length of an `Oauth2CodeVerifier` per RFC 7636.
    pub const PKCE_VERIFIER_MIN_LEN: usize = 43;
    /// Maximum length of an `Oauth2CodeVerifier` per RFC 7636.
    pub const PKCE_VERIFIER_MAX_LEN: usize = 128;
    /// Charset PKCE verifiers are drawn from (RFC 7636 `unreserved` set).
    pub const PKCE_CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
}

/// User id shape: `r` followed by 14 lowercase hex characters.
pub mod user_id {
    /// Fixed prefix for every generated user id.
    pub const PREFIX: char = 'r';
    /// Number of hex characters following the prefix.
    pub const HEX_LEN: usize = 14;
    /// Bit mask selecting the low 56 bits (14 hex chars) of a random u64.
    pub const LOW_56_BITS_MASK: u64 = (1u64 << 56) - 1;
}

/// Password policy.
pub mod password {
    /// Minimum accepted plaintext password length.
    pub const MIN_LENGTH: usize = 8;
    /// bcrypt cost factor used by `GenerateHash`.
    pub const BCRYPT_COST: u32 = 12;
}

/// Job queue defaults.
pub mod jobs {
    /// Default number of attempts before a job is considered terminally failed.
    pub const DEFAULT_MAX_ATTEMPTS: i64 = 3;
    /// Default scheduler tick interval, in seconds.
    pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 15;
    /// Default number of jobs claimed per tick.
    pub const DEFAULT_BATCH_SIZE: i64 = 16;
    /// Default per-job execution deadline, in seconds.
    pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 30;
    /// Default time allowed for in-flight jobs to drain on shutdown.
    pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 30;
    /// Job type tag for the email-verification handler.
    pub const TYPE_EMAIL_VERIFICATION: &str = "email_verification";
    /// Job type tag for the password-reset handler.
    pub const TYPE_PASSWORD_RESET: &str = "password_reset";
    /// Job type tag for the email-change handler.
    pub const TYPE_EMAIL_CHANGE: &str = "email_change";
}

/// Rate-limit / cooldown defaults, all in seconds, overridable from config.
pub mod cooldowns {
    /// Default email-verification request cooldown.
    pub const EMAIL_VERIFICATION_SECS: i64 = 300;
    /// Default password-reset request cooldown.
    pub const PASSWORD_RESET_SECS: i64 = 300;
    /// Default email-change request cooldown.
    pub const EMAIL_CHANGE_SECS: i64 = 300;
}

/// JWT default time-to-live values, in seconds, overridable from config.
pub mod jwt_ttl {
    /// Session token TTL (1 hour).
    pub const SESSION_SECS: i64 = 3_600;
    /// Email verification token TTL (24 hours).
    pub const EMAIL_VERIFICATION_SECS: i64 = 86_400;
    /// Password reset token TTL (1 hour).
    pub const PASSWORD_RESET_SECS: i64 = 3_600;
    /// Email change token TTL (1 hour).
    pub const EMAIL_CHANGE_SECS: i64 = 3_600;
}

/// Notifier fan-out defaults.
pub mod notifier {
    /// Token bucket refill rate: one token per this many seconds.
    pub const TOKEN_BUCKET_PERIOD_SECS: u64 = 2;
    /// Token bucket burst capacity.
    pub const TOKEN_BUCKET_BURST: u32 = 5;
    /// Bounded HTTP timeout for a single backend dispatch, in seconds.
    pub const DISPATCH_TIMEOUT_SECS: u64 = 10;
    /// Discord message length cap before ellipsis truncation.
    pub const DISCORD_MESSAGE_CAP: usize = 2000;
}

/// Config blob scope names.
pub mod config_scope {
    /// The only scope consumed by the config provider today.
    pub const APP: &str = "app";
    /// Format tag for the plaintext inside a config blob.
    pub const FORMAT_TOML: &str = "toml";
}

/// Bounded timeouts for outbound collaborators.
pub mod timeouts {
    /// OAuth2 token-exchange HTTP call deadline, in seconds.
    pub const OAUTH2_EXCHANGE_SECS: u64 = 10;
    /// Healthz database-reachability check deadline, in seconds.
    pub const HEALTHZ_DB_SECS: u64 = 1;
}
