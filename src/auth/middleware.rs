//! The gate: one decision per request, then login, passthrough or the login page.

use crate::auth::session::{derive_session_token, has_session_cookie};
use crate::config::Config;
use crate::error::AppError;
use crate::middleware::Passthrough;
use crate::origin::Origin;
use crate::routes::login;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Path that receives login submissions and serves the login page itself.
pub const LOGIN_PATH: &str = "/cfp_login";

/// Paths reachable without a session.
pub const ALLOWED_PATHS: &[&str] = &[LOGIN_PATH];

/// Application state shared across handlers.
///
/// Everything in here is fixed at startup and only ever read.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Expected cookie value, derived once from the configured password.
    pub session_token: Option<Arc<str>>,
    pub origin: Option<Arc<dyn Origin>>,
}

impl AppState {
    pub fn new(config: Config, origin: Option<Arc<dyn Origin>>) -> Self {
        let session_token: Option<Arc<str>> = config
            .password
            .as_ref()
            .map(|password| Arc::from(derive_session_token(password)));

        Self {
            config: Arc::new(config),
            session_token,
            origin,
        }
    }
}

/// What the gate does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No password configured; nothing can be admitted.
    Misconfigured,
    /// `POST /cfp_login`: check the submitted password.
    Login,
    /// Valid session cookie or allow-listed path: hand the request to the origin.
    PassThrough,
    /// Anything else: show the login form.
    LoginPage,
}

/// Decide how to handle a request. Total over every method, path and cookie header.
pub fn decide(
    method: &Method,
    path: &str,
    cookie_header: Option<&str>,
    state: &AppState,
) -> Decision {
    let Some(token) = state.session_token.as_deref() else {
        return Decision::Misconfigured;
    };

    if method == Method::POST && path == LOGIN_PATH {
        return Decision::Login;
    }

    let authenticated = cookie_header
        .is_some_and(|cookie| has_session_cookie(cookie, token, state.config.cookie_match));

    if authenticated || ALLOWED_PATHS.contains(&path) {
        Decision::PassThrough
    } else {
        Decision::LoginPage
    }
}

/// Join every `Cookie` header on the request. HTTP/2 clients may send one per cookie.
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let cookies: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    }
}

/// Entry point for every request.
pub async fn gate(State(state): State<AppState>, request: Request) -> Response {
    let cookie = cookie_header(request.headers());
    let decision = decide(
        request.method(),
        request.uri().path(),
        cookie.as_deref(),
        &state,
    );

    tracing::debug!(
        method = %request.method(),
        path = %request.uri().path(),
        decision = ?decision,
        "Gate decision"
    );

    match decision {
        Decision::Misconfigured => {
            AppError::Misconfigured("password is not configured".to_string()).into_response()
        }
        Decision::Login => login::submit(&state, request).await,
        Decision::PassThrough => forward(&state, request).await,
        Decision::LoginPage => login::page(request.uri()),
    }
}

/// Hand an admitted request to the origin. Fails closed when there is none.
async fn forward(state: &AppState, request: Request) -> Response {
    let Some(origin) = state.origin.as_ref() else {
        return AppError::Misconfigured("assets handler is not configured".to_string())
            .into_response();
    };

    match origin.forward(request).await {
        Ok(mut response) => {
            response.extensions_mut().insert(Passthrough);
            response
        }
        Err(e) => e.into_response(),
    }
}
