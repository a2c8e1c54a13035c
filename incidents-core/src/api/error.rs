//! HTTP error mapping.
//!
//! Every error leaves the service as `{"detail": "..."}`. Any body, query
//! string or path that fails to parse is a 422. Storage failures are logged
//! here and reported without their cause.

use crate::error::{StoreError, ValidationError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Errors returned by the incident handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or unacceptable body, query string or path.
    #[error("{0}")]
    Validation(String),

    /// Request body that could not be read at all.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Incident not found")]
    NotFound,

    #[error("Internal Server Error")]
    Internal(#[source] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rejected { status, .. } => *status,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound,
            other => ApiError::Internal(other),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::BytesRejection(e) => ApiError::Rejected {
                status: e.status(),
                message: e.body_text(),
            },
            other => ApiError::Validation(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            error!(error = %source, "Request failed in storage");
        }
        let body = json!({ "detail": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
