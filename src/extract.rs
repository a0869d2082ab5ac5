//! Request-body extraction (spec §4.4 steps i+iii): content-type check
//! then JSON decode, both mapped onto catalog error codes before a handler
//! ever sees the body.

use axum::extract::{FromRequest, Request};
use axum::http::header;
use axum::Json;

use crate::errors::{AppError, ErrorCode};

/// Wraps [`axum::Json`] with the spec's content-type gate. Rejects with
/// [`ErrorCode::InvalidContentType`] before attempting to decode, and with
/// [`ErrorCode::InvalidInput`] if decoding fails.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("application/json") {
            return Err(ErrorCode::InvalidContentType.into());
        }
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::new(ErrorCode::InvalidInput, e.to_string()))?;
        Ok(Self(value))
    }
}
