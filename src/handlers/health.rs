//! `GET /healthz`, `GET /metrics` (SPEC_FULL.md §6).

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::constants::timeouts::HEALTHZ_DB_SECS;
use crate::errors::{catalog, AppError, ErrorCode, Outcome};
use crate::state::AppState;

/// Route group for the two operational endpoints.
pub struct HealthRoutes;

impl HealthRoutes {
    /// Builds the `/healthz` and `/metrics` routes.
    #[must_use]
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(Self::healthz))
            .route("/metrics", get(Self::metrics))
            .with_state(state)
    }

    async fn healthz(State(state): State<AppState>) -> Result<Response, AppError> {
        let ping = tokio::time::timeout(
            std::time::Duration::from_secs(HEALTHZ_DB_SECS),
            sqlx::query("SELECT 1").execute(state.db.pool()),
        )
        .await;

        match ping {
            Ok(Ok(_)) => Ok(catalog().get(Outcome::OkHealth).into_response()),
            _ => Err(ErrorCode::ServiceUnavailable.into()),
        }
    }

    /// Raw Prometheus text exposition, not wrapped in the JSON envelope
    /// every other endpoint uses.
    async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
        let body = state
            .metrics
            .encode()
            .map_err(|e| AppError::new(ErrorCode::InternalError, e.to_string()))?;
        let mut response = (StatusCode::OK, body).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"));
        Ok(response)
    }
}
