//! Error types and Axum response conversions.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Application error types.
///
/// Failed logins are not errors; they are redirects. These variants cover the cases
/// where the gate cannot do its job at all.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The gate is missing a required piece of configuration. The message is safe to
    /// show to the client and is returned as the response body.
    #[error("Misconfigured: {0}")]
    Misconfigured(String),

    /// The request cannot be mapped onto the origin.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Misconfigured(msg) => {
                tracing::error!(error = %msg, "Gate is misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::NotFound(msg) => {
                tracing::warn!(error = %msg, "Request rejected");
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            AppError::BadGateway(msg) => {
                // Upstream details stay in the log
                tracing::error!(error = %msg, "Origin request failed");
                (StatusCode::BAD_GATEWAY, "Bad gateway".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::BadGateway(format!("Upstream error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    /// Extract status code, content type and body from an AppError response.
    async fn error_response(err: AppError) -> (StatusCode, String, String) {
        let response = err.into_response();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_misconfigured_shows_diagnostic() {
        let (status, content_type, body) = error_response(AppError::Misconfigured(
            "assets handler is not configured".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body, "assets handler is not configured");
    }

    #[tokio::test]
    async fn test_bad_gateway_hides_details() {
        let (status, _, body) = error_response(AppError::BadGateway(
            "connection refused at 10.0.0.5:8080".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, "Bad gateway");
        assert!(!body.contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_not_found_hides_details() {
        let (status, _, body) =
            error_response(AppError::NotFound("path escapes /site".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not found");
    }

    #[tokio::test]
    async fn test_internal_hides_details() {
        let (status, _, body) =
            error_response(AppError::Internal("template blew up".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal server error");
    }
}
