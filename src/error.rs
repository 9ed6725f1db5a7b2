//! Request-level error taxonomy and its JSON response shape.
//!
//! Every non-2xx response this service produces has the body `{"error": "..."}`.
//! Client input errors map to 400, unknown routes to 404, unsupported methods
//! to 405, and provider or internal failures to 500 carrying the error's
//! display string.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderError;

/// Uniform error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No JSON data received")]
    MissingBody,

    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("No feature provided")]
    MissingFeature,

    #[error("Feature description too long (max {max} characters)")]
    FeatureTooLong { max: usize },

    #[error("Endpoint not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("Template rendering error: {0}")]
    Template(#[from] tera::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingBody
            | AppError::InvalidBody(_)
            | AppError::MissingFeature
            | AppError::FeatureTooLong { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Provider(_) | AppError::Template(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_bad_request() {
        assert_eq!(AppError::MissingBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidBody("eof".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingFeature.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::FeatureTooLong { max: 10 }.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_provider_error_keeps_its_message() {
        let err = AppError::from(ProviderError::Network("connection refused".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Provider network error: connection refused");
    }

    #[test]
    fn test_routing_errors() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(AppError::MethodNotAllowed.to_string(), "Method not allowed");
    }

    #[test]
    fn test_missing_feature_message() {
        assert_eq!(AppError::MissingFeature.to_string(), "No feature provided");
    }
}
