use axum::extract::{Path, State};
use chrono::Utc;

use super::{ApiResult, Deleted, deleted, found, ok};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiQuery},
    models::{
        self, ApiResponse, Apprenant, ApprenantFilter, CreateApprenantRequest, ErrorEnvelope,
        PageRequest, UpdateApprenantRequest,
    },
    repository::RepositoryState,
};

#[utoipa::path(
    get,
    path = "/api/apprenants-payload",
    params(ApprenantFilter),
    responses(
        (status = 200, description = "Learners", body = ApiResponse<Vec<Apprenant>>),
        (status = 503, description = "Store unreachable", body = ErrorEnvelope)
    )
)]
pub async fn list_apprenants(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    ApiQuery(filter): ApiQuery<ApprenantFilter>,
) -> ApiResult<Vec<Apprenant>> {
    let page = PageRequest::new(filter.page, filter.limit);
    let apprenants = repo.list_apprenants(&filter, page).await?;
    Ok(axum::Json(ApiResponse::paginated(apprenants, page)))
}

#[utoipa::path(
    get,
    path = "/api/apprenants-payload/{id}",
    params(("id" = String, Path, description = "Learner id")),
    responses(
        (status = 200, description = "Found", body = ApiResponse<Apprenant>),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn get_apprenant(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<Apprenant> {
    ok(found(repo.get_apprenant(&id).await?, "apprenant")?)
}

/// create_apprenant
///
/// [Authenticated Route] Registers a learner. The email is unique across the
/// collection (409 on reuse).
#[utoipa::path(
    post,
    path = "/api/apprenants-payload",
    request_body = CreateApprenantRequest,
    responses(
        (status = 200, description = "Created", body = ApiResponse<Apprenant>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
        (status = 409, description = "Email already registered", body = ErrorEnvelope)
    )
)]
pub async fn create_apprenant(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    ApiJson(payload): ApiJson<CreateApprenantRequest>,
) -> ApiResult<Apprenant> {
    let apprenant = payload.into_apprenant(models::new_id(), Utc::now());
    apprenant.validate()?;
    repo.insert_apprenant(&apprenant).await?;

    tracing::info!(apprenant_id = %apprenant.id, "apprenant created");
    ok(apprenant)
}

#[utoipa::path(
    put,
    path = "/api/apprenants-payload/{id}",
    params(("id" = String, Path, description = "Learner id")),
    request_body = UpdateApprenantRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<Apprenant>),
        (status = 404, description = "Not found", body = ErrorEnvelope),
        (status = 409, description = "Email already registered", body = ErrorEnvelope)
    )
)]
pub async fn update_apprenant(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateApprenantRequest>,
) -> ApiResult<Apprenant> {
    let mut apprenant = found(repo.get_apprenant(&id).await?, "apprenant")?;
    payload.apply(&mut apprenant, Utc::now());
    apprenant.validate()?;

    if !repo.replace_apprenant(&apprenant).await? {
        return Err(ApiError::not_found("apprenant"));
    }
    ok(apprenant)
}

#[utoipa::path(
    delete,
    path = "/api/apprenants-payload/{id}",
    params(("id" = String, Path, description = "Learner id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn delete_apprenant(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let removed = repo.delete_apprenant(&id).await?;
    deleted(removed, id, "apprenant")
}
