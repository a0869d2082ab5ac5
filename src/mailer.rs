//! Outbound mail (spec §4.11 mailer collaborator).
//!
//! `lettre`'s `Message::builder()` + `AsyncSmtpTransport<Tokio1Executor>`
//! is the natural ecosystem choice here, the same way other Rust backends
//! in the retrieval pack reach for it (see `kovacsdavid-obvia`'s
//! `send_email_verification`); the teacher itself never sends email. A
//! `NoopMailer` backs local/dev runs, grounded in the teacher's
//! `NilNotifier`-shaped null object.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::provider::SmtpConfig;
use crate::errors::{AppError, ErrorCode};

/// Sends plain-text mail. Implementors must be safe to hold for the life
/// of the process (no per-request connection setup).
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message.
    ///
    /// # Errors
    /// Returns [`AppError`] if the message cannot be built or the
    /// transport rejects it.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Real SMTP transport, configured from the decrypted config blob's SMTP
/// section.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Builds a transport from `config` over implicit TLS.
    ///
    /// # Errors
    /// Returns [`AppError`] if the host cannot be resolved into a valid
    /// transport configuration.
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("smtp relay: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("from address: {e}")))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("to address: {e}")))?;
        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("building message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::new(ErrorCode::InternalError, format!("smtp send: {e}")))?;
        Ok(())
    }
}

/// Logs the message instead of sending it. Selected when the config's
/// SMTP section is absent (local/dev runs).
pub struct NoopMailer;

#[async_trait::async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        tracing::info!(mail.to = %to, mail.subject = %subject, mail.body = %body, "noop mailer: would have sent");
        Ok(())
    }
}
