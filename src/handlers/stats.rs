use axum::extract::State;
use chrono::Local;

use super::{ApiResult, ok};
use crate::{
    auth::AuthUser,
    models::{ApiResponse, DashboardStats},
    repository::RepositoryState,
};

/// get_dashboard_stats
///
/// [Authenticated Route] Counters for the back-office dashboard. "Upcoming"
/// appointments are counted from today in server local time.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses((status = 200, description = "Dashboard counters", body = ApiResponse<DashboardStats>))
)]
pub async fn get_dashboard_stats(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
) -> ApiResult<DashboardStats> {
    let today = Local::now().date_naive();
    ok(repo.stats(today).await?)
}
