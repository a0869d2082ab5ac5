//! Registered job handlers (spec §4.6): email-verification, password-
//! reset, email-change. Each mints a typed JWT under the matching domain
//! secret, renders a plain-text template, and hands it to the mailer.

use chrono::Duration;

use super::payloads::{EmailChangeExtra, EmailChangePayload, EmailVerificationPayload, PasswordResetPayload};
use super::HandlerContext;
use crate::crypto::jwt::new_jwt;
use crate::crypto::{Claims, SigningKey, TokenType};

fn claims_for(user_id: String, email: String, token_type: TokenType, new_email: Option<String>) -> Claims {
    Claims {
        iat: 0,
        exp: 0,
        user_id,
        email,
        token_type,
        new_email,
    }
}

/// Mints and mails an email-verification token (spec §4.4
/// `confirm-email-verification` is the corresponding endpoint).
///
/// # Errors
/// Returns an error if the user no longer exists, key derivation fails
/// (short domain secret), or the mailer rejects the message.
pub async fn email_verification(ctx: &HandlerContext, job: &crate::models::Job) -> anyhow::Result<()> {
    let payload: EmailVerificationPayload = serde_json::from_slice(&job.payload)?;
    let user = ctx
        .db
        .users()
        .get_by_email(&payload.email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} vanished before verification send", payload.email))?;

    let config = ctx.config.get();
    let key = SigningKey::derive(
        &user.email,
        &user.password_hash,
        config.auth.verification_email_secret.as_bytes(),
    )?;
    let claims = claims_for(user.id.clone(), user.email.clone(), TokenType::EmailVerification, None);
    let token = new_jwt(
        claims,
        &key,
        Duration::seconds(config.auth.email_verification_ttl_secs),
    )?;

    let body = format!(
        "Confirm your email address by presenting this token to \
         POST /confirm-email-verification:\n\n{token}"
    );
    ctx.mailer
        .send(&user.email, "Verify your email address", &body)
        .await?;
    Ok(())
}

/// Mints and mails a password-reset token.
///
/// # Errors
/// Returns an error if the user no longer exists, key derivation fails,
/// or the mailer rejects the message.
pub async fn password_reset(ctx: &HandlerContext, job: &crate::models::Job) -> anyhow::Result<()> {
    let payload: PasswordResetPayload = serde_json::from_slice(&job.payload)?;
    let user = ctx
        .db
        .users()
        .get_by_email(&payload.email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} vanished before reset send", payload.email))?;

    let config = ctx.config.get();
    let key = SigningKey::derive(
        &user.email,
        &user.password_hash,
        config.auth.password_reset_secret.as_bytes(),
    )?;
    let claims = claims_for(user.id.clone(), user.email.clone(), TokenType::PasswordReset, None);
    let token = new_jwt(claims, &key, Duration::seconds(config.auth.password_reset_ttl_secs))?;

    let body = format!(
        "Reset your password by presenting this token to \
         POST /confirm-password-reset:\n\n{token}"
    );
    ctx.mailer
        .send(&user.email, "Reset your password", &body)
        .await?;
    Ok(())
}

/// Mints and mails an email-change confirmation token, sent to the *new*
/// address so the handler also proves ownership of it.
///
/// # Errors
/// Returns an error if the user no longer exists, key derivation fails,
/// or the mailer rejects the message.
pub async fn email_change(ctx: &HandlerContext, job: &crate::models::Job) -> anyhow::Result<()> {
    let payload: EmailChangePayload = serde_json::from_slice(&job.payload)?;
    let extra: EmailChangeExtra = serde_json::from_slice(&job.payload_extra)?;
    let user = ctx
        .db
        .users()
        .get_by_id(&payload.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} vanished before email-change send", payload.user_id))?;

    let config = ctx.config.get();
    let key = SigningKey::derive(
        &user.email,
        &user.password_hash,
        config.auth.email_change_secret.as_bytes(),
    )?;
    let claims = claims_for(
        user.id.clone(),
        user.email.clone(),
        TokenType::EmailChange,
        Some(extra.new_email.clone()),
    );
    let token = new_jwt(claims, &key, Duration::seconds(config.auth.email_change_ttl_secs))?;

    let body = format!(
        "Confirm your new email address by presenting this token and your \
         current password to POST /confirm-email-change:\n\n{token}"
    );
    ctx.mailer
        .send(&extra.new_email, "Confirm your new email address", &body)
        .await?;
    Ok(())
}
