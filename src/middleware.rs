//! Security headers middleware.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Response extension marking a response that came from the origin.
///
/// Those responses go back to the client verbatim, so header middleware skips them.
#[derive(Debug, Clone, Copy)]
pub struct Passthrough;

/// Middleware that adds security headers to responses produced by the gate itself:
/// the login page, login redirects and diagnostics.
///
/// - **Referrer-Policy: no-referrer**
/// - **X-Content-Type-Options: nosniff**
/// - **X-Frame-Options: DENY**: the login form must not be framed.
/// - **Content-Security-Policy**: nothing but the inline stylesheet, and the form may
///   only post back to this origin.
///
/// Cache-Control is set by the handlers, not here.
///
/// # Usage
///
/// ```rust,no_run
/// use axum::Router;
/// use axum::middleware;
/// use cfpgate::middleware::security_headers;
///
/// let app: Router = Router::new()
///     .layer(middleware::from_fn(security_headers));
/// ```
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if response.extensions().get::<Passthrough>().is_some() {
        return response;
    }

    let headers = response.headers_mut();
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(
            "default-src 'none'; \
             style-src 'unsafe-inline'; \
             form-action 'self'; \
             frame-ancestors 'none'; \
             base-uri 'none'",
        ),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        response::IntoResponse,
        Router,
    };
    use tower::ServiceExt;

    async fn gate_handler() -> impl IntoResponse {
        (StatusCode::OK, "login page")
    }

    async fn origin_handler() -> Response {
        let mut response = (StatusCode::OK, "from origin").into_response();
        response.extensions_mut().insert(Passthrough);
        response
    }

    fn app() -> Router {
        Router::new()
            .route("/", axum::routing::get(gate_handler))
            .route("/asset", axum::routing::get(origin_handler))
            .layer(middleware::from_fn(security_headers))
    }

    #[tokio::test]
    async fn test_security_headers_applied() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");

        let csp = headers
            .get("content-security-policy")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(csp.contains("default-src 'none'"));
        assert!(csp.contains("form-action 'self'"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[tokio::test]
    async fn test_passthrough_untouched() {
        let response = app()
            .oneshot(Request::builder().uri("/asset").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-frame-options").is_none());
        assert!(response.headers().get("content-security-policy").is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "from origin");
    }
}
