//! HTTP routing.

pub mod login;

use crate::auth::middleware::{gate, AppState};
use crate::middleware::security_headers;
use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

/// Build the gate router.
///
/// There are no individual routes: every method and path goes through [`gate`], which
/// makes the login/passthrough/login-page decision itself.
pub fn gate_router(state: AppState) -> Router {
    let body_limit = state.config.max_login_body_bytes;

    Router::new()
        .fallback(gate)
        // Only extractors honour this, so it caps login forms and not proxied bodies
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
