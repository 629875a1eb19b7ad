//! Login submission and the login page.

use crate::auth::middleware::{AppState, LOGIN_PATH};
use crate::auth::session::session_set_cookie;
use crate::auth::verify::verify_password;
use crate::error::AppError;
use crate::models::{LoginForm, LoginPageQuery};
use axum::{
    extract::{FromRequest, Query, Request},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Form,
};
use minijinja::{context, Environment, Value};

const LOGIN_TEMPLATE_NAME: &str = "login.html";
const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");

/// POST /cfp_login: check the password and redirect.
///
/// Success sets the session cookie and redirects to the `redirect` field. Failure
/// redirects to the same target with `?error=1` so the login page shows the banner.
/// An unreadable body is treated as an empty form.
pub async fn submit(state: &AppState, request: Request) -> Response {
    let (Some(configured), Some(token)) = (
        state.config.password.as_ref(),
        state.session_token.as_deref(),
    ) else {
        return AppError::Misconfigured("password is not configured".to_string()).into_response();
    };

    let form = match Form::<LoginForm>::from_request(request, state).await {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable login submission");
            LoginForm::default()
        }
    };

    let redirect = safe_redirect(form.redirect.as_deref());
    let submitted = form.password.as_deref().map(String::as_str).unwrap_or("");

    if verify_password(submitted, configured) {
        tracing::info!(redirect = %redirect, "Login succeeded");
        (
            StatusCode::FOUND,
            [
                (header::SET_COOKIE, session_set_cookie(token)),
                (header::CACHE_CONTROL, "no-cache".to_string()),
                (header::LOCATION, redirect),
            ],
        )
            .into_response()
    } else {
        tracing::warn!(redirect = %redirect, "Login failed");
        (
            StatusCode::FOUND,
            [
                (header::CACHE_CONTROL, "no-cache".to_string()),
                (header::LOCATION, format!("{}?error=1", redirect)),
            ],
        )
            .into_response()
    }
}

/// The login form for a request that has no session.
///
/// The requested path becomes the post-login redirect target.
pub fn page(uri: &Uri) -> Response {
    let query = Query::<LoginPageQuery>::try_from_uri(uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    match render_login_page(uri.path(), query.has_error()) {
        Ok(html) => (
            StatusCode::OK,
            [(header::CACHE_CONTROL, "no-cache")],
            Html(html),
        )
            .into_response(),
        Err(e) => AppError::Internal(format!("Failed to render login page: {}", e)).into_response(),
    }
}

/// Fill in the login template. The `.html` name turns on HTML auto-escaping, so the
/// redirect path is escaped on the way in.
pub fn render_login_page(
    redirect_path: &str,
    with_error: bool,
) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(LOGIN_TEMPLATE_NAME, LOGIN_TEMPLATE)?;

    env.get_template(LOGIN_TEMPLATE_NAME)?.render(context! {
        login_path => Value::from_safe_string(LOGIN_PATH.to_string()),
        redirect => redirect_path,
        error => with_error,
    })
}

/// Post-login target from the submitted `redirect` field.
///
/// Only local absolute paths are honoured. Missing, empty, protocol-relative
/// (`//host`, `/\host`) or control-character values fall back to `/`. Relative values
/// such as `dashboard` are not echoed into `Location` either; they also become `/`.
pub fn safe_redirect(raw: Option<&str>) -> String {
    match raw {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
