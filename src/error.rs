use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorEnvelope;

/// RepoError
///
/// Failures raised by the persistence layer. Every `Repository` implementation
/// (MongoDB or in-memory) reports through this type so handlers never see
/// driver-specific errors.
#[derive(Error, Debug)]
pub enum RepoError {
    /// The store could not be reached (server selection timeout, IO, simulated outage).
    #[error("data store unavailable: {0}")]
    Unavailable(String),

    /// A unique index rejected the write.
    #[error("duplicate value for unique field `{field}`")]
    Duplicate { field: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("document (de)serialization failed: {0}")]
    Serialization(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// StorageError
///
/// Failures from the object storage service.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("presigned URL generation failed: {0}")]
    Presign(String),

    #[error("object deletion failed: {0}")]
    Delete(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// ApiError
///
/// The request-boundary error. Converts into the `{ success: false, error }`
/// envelope with the matching HTTP status.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("service temporarily unavailable")]
    Unavailable(String),

    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Unavailable(cause) => ApiError::Unavailable(cause),
            RepoError::Duplicate { field } => {
                ApiError::Conflict(format!("a record with this `{field}` already exists"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side causes are logged but never leaked to the client.
        match &self {
            ApiError::Unavailable(cause) => tracing::error!(%cause, "backing store unavailable"),
            ApiError::Internal(cause) => tracing::error!(%cause, "request failed"),
            other => tracing::debug!(status = %status, error = %other, "request rejected"),
        }

        let body = ErrorEnvelope {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
