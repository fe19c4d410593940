//! HTTP handlers, grouped by collection. Every JSON handler returns
//! `Result<Json<ApiResponse<T>>, ApiError>` so success and failure share the
//! `{ success, data | error }` envelope.

use axum::Json;

use crate::{error::ApiError, models::ApiResponse};

pub mod apprenants;
pub mod articles;
pub mod formations;
pub mod health;
pub mod media;
pub mod programmes;
pub mod rendez_vous;
pub mod stats;
pub mod users;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wraps `data` in the success envelope.
pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Turns a missing record into a 404 naming `what`.
pub(crate) fn found<T>(record: Option<T>, what: &str) -> Result<T, ApiError> {
    record.ok_or_else(|| ApiError::not_found(what))
}

/// Delete responses echo the removed id.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct Deleted {
    pub id: String,
}

pub(crate) fn deleted(removed: bool, id: String, what: &str) -> ApiResult<Deleted> {
    if removed {
        ok(Deleted { id })
    } else {
        Err(ApiError::not_found(what))
    }
}
