//! Assembles the full HTTP router by merging each route group, grounded
//! in the teacher's `routes::admin::AdminRoutes::routes` merge pattern
//! (`Router::new().merge(a).merge(b)...`).
//!
//! Middleware order follows the request-control-flow in SPEC_FULL.md
//! §4.12: the catch-panic layer is outermost so a handler panic is mapped
//! to the catalog response before anything else runs; inside it, the
//! block-list gate runs next and can short-circuit a request before the
//! recorder even starts timing it.

use std::any::Any;

use axum::body::Body;
use axum::http::Response;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

use crate::errors::ErrorCode;
use crate::handlers::email_change::EmailChangeRoutes;
use crate::handlers::email_verification::EmailVerificationRoutes;
use crate::handlers::health::HealthRoutes;
use crate::handlers::oauth2::Oauth2Routes;
use crate::handlers::password::PasswordRoutes;
use crate::handlers::password_reset::PasswordResetRoutes;
use crate::middleware::{block_list, recorder};
use crate::state::AppState;

/// Builds the top-level [`Router`] serving every endpoint over a single
/// bound address.
#[must_use]
pub fn build(state: AppState) -> Router {
    Router::new()
        .merge(PasswordRoutes::routes(state.clone()))
        .merge(Oauth2Routes::routes(state.clone()))
        .merge(EmailVerificationRoutes::routes(state.clone()))
        .merge(PasswordResetRoutes::routes(state.clone()))
        .merge(EmailChangeRoutes::routes(state.clone()))
        .merge(HealthRoutes::routes(state.clone()))
        .layer(from_fn_with_state(state.clone(), recorder::record))
        .layer(from_fn_with_state(state, block_list::gate))
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// Converts a caught handler panic into the catalog's
/// `err_service_unavailable` response (spec §7: "a panic in the HTTP path
/// is caught by outer middleware and converted to `err_service_unavailable`").
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string());
    tracing::error!(panic.detail = %detail, "request handler panicked");
    crate::errors::catalog()
        .error(ErrorCode::ServiceUnavailable)
        .into_response()
}
