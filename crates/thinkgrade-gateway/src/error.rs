//! The gateway's caller-visible error taxonomy.
//!
//! Every failure on `/evaluate` ends up here and leaves as one JSON envelope
//! `{"error": ..., "details"?: ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use thinkgrade_core::error::EvaluationError;

pub const RATE_LIMIT_MESSAGE: &str = "Too many evaluation requests. Please retry in a minute.";
pub const UPSTREAM_MESSAGE: &str = "Failed to generate the evaluation. Please try again shortly.";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or too-short input.
    #[error("{0}")]
    Validation(String),

    /// Origin not on the allow-list.
    #[error("origin not allowed")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("rate limit exceeded")]
    RateLimited,

    /// LLM call, credential or reply validation failure.
    #[error("evaluation failed: {0}")]
    Upstream(#[from] EvaluationError),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Forbidden => StatusCode::FORBIDDEN,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the response may carry CORS headers.
    pub fn allows_cors(&self) -> bool {
        !matches!(self, GatewayError::Forbidden | GatewayError::NotFound)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            GatewayError::Forbidden => status.into_response(),
            GatewayError::NotFound => (status, "Not Found").into_response(),
            GatewayError::Validation(message) => (
                status,
                Json(ErrorBody {
                    error: &message,
                    details: None,
                }),
            )
                .into_response(),
            GatewayError::RateLimited => (
                status,
                Json(ErrorBody {
                    error: RATE_LIMIT_MESSAGE,
                    details: None,
                }),
            )
                .into_response(),
            // Provider and validator messages never contain credentials.
            GatewayError::Upstream(e) => (
                status,
                Json(ErrorBody {
                    error: UPSTREAM_MESSAGE,
                    details: Some(format!("{e:#}")),
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use thinkgrade_core::error::{FeedbackError, ProviderError};

    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(GatewayError::Validation("x".into()).status(), 400);
        assert_eq!(GatewayError::Forbidden.status(), 403);
        assert_eq!(GatewayError::NotFound.status(), 404);
        assert_eq!(GatewayError::RateLimited.status(), 429);
        let upstream = GatewayError::from(EvaluationError::Feedback(FeedbackError::NoJsonObject));
        assert_eq!(upstream.status(), 500);
    }

    #[test]
    fn cors_withheld_for_forbidden_and_not_found() {
        assert!(!GatewayError::Forbidden.allows_cors());
        assert!(!GatewayError::NotFound.allows_cors());
        assert!(GatewayError::RateLimited.allows_cors());
        assert!(GatewayError::Validation("x".into()).allows_cors());
    }

    #[test]
    fn forbidden_has_empty_body() {
        let response = GatewayError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get("content-type").is_none());
    }

    #[test]
    fn upstream_details_carry_provider_message() {
        let err = GatewayError::from(EvaluationError::Provider(
            ProviderError::MissingCredential("ANTHROPIC_API_KEY".into()).into(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
    }
}
