use axum::extract::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ApiResult, ok};
use crate::{
    models::{ApiResponse, ErrorEnvelope},
    repository::RepositoryState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
}

/// liveness
///
/// Plain-text probe for load balancers. Never touches the store.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is up", body = String))
)]
pub async fn liveness() -> &'static str {
    "ok"
}

/// readiness
///
/// Pings the backing store; 503 with the failure envelope when unreachable.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Store reachable", body = ApiResponse<HealthStatus>),
        (status = 503, description = "Store unreachable", body = ErrorEnvelope)
    )
)]
pub async fn readiness(State(repo): State<RepositoryState>) -> ApiResult<HealthStatus> {
    repo.ping().await?;
    ok(HealthStatus {
        status: "ok".to_string(),
        database: "connected".to_string(),
    })
}
