//! `request-password-reset`, `confirm-password-reset` (spec §4.4).

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use super::mint_session_response;
use crate::constants::jobs::{DEFAULT_MAX_ATTEMPTS, TYPE_PASSWORD_RESET};
use crate::crypto::jwt::{parse_jwt, parse_jwt_unverified};
use crate::crypto::password::{check_password, generate_hash};
use crate::crypto::SigningKey;
use crate::crypto::TokenType;
use crate::database::jobs::NewJob;
use crate::errors::{catalog, AppError, ErrorCode, InsertJobError, Outcome};
use crate::extract::ValidatedJson;
use crate::jobs::payloads::{cooldown_bucket, PasswordResetPayload};
use crate::state::AppState;
use crate::validation::is_valid_password;

/// Route group for the password-reset request/confirm pair.
pub struct PasswordResetRoutes;

impl PasswordResetRoutes {
    /// Builds the `/request-password-reset` and `/confirm-password-reset`
    /// routes.
    #[must_use]
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/request-password-reset", post(Self::request))
            .route("/confirm-password-reset", post(Self::confirm))
            .with_state(state)
    }

    async fn request(
        State(state): State<AppState>,
        ValidatedJson(body): ValidatedJson<RequestPasswordReset>,
    ) -> Result<Response, AppError> {
        // A database error here collapses to the same response as "user not
        // found" (spec §9 ambiguity, resolved toward strict anti-enumeration):
        // a caller must never distinguish a transient DB hiccup from an
        // absent account via this endpoint.
        let user = state.db.users().get_by_email(&body.email).await.ok().flatten();

        let Some(user) = user else {
            return Ok(catalog().get(Outcome::OkPasswordResetRequested).into_response());
        };
        if !user.verified {
            return Err(ErrorCode::UnverifiedEmail.into());
        }
        if user.password_hash.is_empty() {
            return Err(ErrorCode::Oauth2OnlyAccount.into());
        }

        let config = state.config.get();
        let bucket = cooldown_bucket(config.cooldowns.password_reset_secs, chrono::Utc::now());
        let payload = PasswordResetPayload {
            email: user.email.clone(),
            cooldown_bucket: bucket,
        };
        let payload_bytes = serde_json::to_vec(&payload)
            .map_err(|e| AppError::new(ErrorCode::InternalError, e.to_string()))?;

        match state
            .db
            .jobs()
            .insert(NewJob {
                job_type: TYPE_PASSWORD_RESET,
                payload: &payload_bytes,
                payload_extra: b"",
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                scheduled_for: chrono::Utc::now(),
            })
            .await
        {
            Ok(_) | Err(InsertJobError::ConstraintUnique) => {
                Ok(catalog().get(Outcome::OkPasswordResetRequested).into_response())
            }
            Err(InsertJobError::Other) => Err(ErrorCode::ServiceUnavailable.into()),
        }
    }

    async fn confirm(
        State(state): State<AppState>,
        ValidatedJson(body): ValidatedJson<ConfirmPasswordReset>,
    ) -> Result<Response, AppError> {
        if !is_valid_password(&body.password) || body.password != body.password_confirm {
            return Err(ErrorCode::InvalidInput.into());
        }

        let claims = parse_jwt_unverified(&body.token)?;
        if claims.token_type != TokenType::PasswordReset {
            return Err(ErrorCode::InvalidVerificationToken.into());
        }

        let user = state
            .db
            .users()
            .get_by_id(&claims.user_id)
            .await?
            .ok_or(ErrorCode::InvalidToken)?;

        let config = state.config.get();
        let key = SigningKey::derive(
            &claims.email,
            &user.password_hash,
            config.auth.password_reset_secret.as_bytes(),
        )?;
        parse_jwt(&body.token, &key)?;

        if check_password(&body.password, &user.password_hash) {
            return Ok(catalog().get(Outcome::OkPasswordResetNotNeeded).into_response());
        }

        let new_hash = generate_hash(&body.password)?;
        state.db.users().update_password_hash(&user.id, &new_hash).await?;

        let mut updated_user = user;
        updated_user.password_hash = new_hash;
        mint_session_response(&updated_user, &config.auth)
    }
}

#[derive(Debug, Deserialize)]
struct RequestPasswordReset {
    email: String,
}

#[derive(Debug, Deserialize)]
struct ConfirmPasswordReset {
    token: String,
    password: String,
    password_confirm: String,
}
