use axum::extract::{Path, State};
use chrono::Utc;

use super::{ApiResult, Deleted, deleted, found, ok};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiQuery},
    models::{
        self, ApiResponse, CreateProgrammeRequest, ErrorEnvelope, PageRequest, Programme,
        ProgrammeFilter, UpdateProgrammeRequest,
    },
    repository::RepositoryState,
};

/// list_public_programmes
///
/// [Public Route] The published catalogue. `publie` in the query is ignored:
/// drafts never leak to anonymous visitors.
#[utoipa::path(
    get,
    path = "/api/programmes",
    params(ProgrammeFilter),
    responses(
        (status = 200, description = "Published programmes", body = ApiResponse<Vec<Programme>>),
        (status = 503, description = "Store unreachable", body = ErrorEnvelope)
    )
)]
pub async fn list_public_programmes(
    State(repo): State<RepositoryState>,
    ApiQuery(mut filter): ApiQuery<ProgrammeFilter>,
) -> ApiResult<Vec<Programme>> {
    filter.publie = Some(true);
    let page = PageRequest::new(filter.page, filter.limit);
    let programmes = repo.list_programmes(&filter, page).await?;
    Ok(axum::Json(ApiResponse::paginated(programmes, page)))
}

/// get_public_programme
///
/// [Public Route] One published programme. Drafts answer 404.
#[utoipa::path(
    get,
    path = "/api/programmes/{id}",
    params(("id" = String, Path, description = "Programme id")),
    responses(
        (status = 200, description = "Found", body = ApiResponse<Programme>),
        (status = 404, description = "Unknown or unpublished", body = ErrorEnvelope)
    )
)]
pub async fn get_public_programme(
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<Programme> {
    let programme = repo
        .get_programme(&id)
        .await?
        .filter(|programme| programme.est_publie);
    ok(found(programme, "programme")?)
}

/// list_all_programmes
///
/// [Authenticated Route] Every programme, drafts included; `publie` filters.
#[utoipa::path(
    get,
    path = "/api/admin/programmes",
    params(ProgrammeFilter),
    responses((status = 200, description = "All programmes", body = ApiResponse<Vec<Programme>>))
)]
pub async fn list_all_programmes(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    ApiQuery(filter): ApiQuery<ProgrammeFilter>,
) -> ApiResult<Vec<Programme>> {
    let page = PageRequest::new(filter.page, filter.limit);
    let programmes = repo.list_programmes(&filter, page).await?;
    Ok(axum::Json(ApiResponse::paginated(programmes, page)))
}

/// create_programme
///
/// [Authenticated Route] A repeated `code_formation` answers 409.
#[utoipa::path(
    post,
    path = "/api/programmes",
    request_body = CreateProgrammeRequest,
    responses(
        (status = 200, description = "Created", body = ApiResponse<Programme>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
        (status = 409, description = "Duplicate code_formation", body = ErrorEnvelope)
    )
)]
pub async fn create_programme(
    AuthUser { id: user_id, .. }: AuthUser,
    State(repo): State<RepositoryState>,
    ApiJson(payload): ApiJson<CreateProgrammeRequest>,
) -> ApiResult<Programme> {
    let programme = payload.into_programme(models::new_id(), Utc::now());
    programme.validate()?;
    repo.insert_programme(&programme).await?;

    tracing::info!(programme_id = %programme.id, code = %programme.code_formation, %user_id, "programme created");
    ok(programme)
}

#[utoipa::path(
    put,
    path = "/api/programmes/{id}",
    params(("id" = String, Path, description = "Programme id")),
    request_body = UpdateProgrammeRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<Programme>),
        (status = 404, description = "Not found", body = ErrorEnvelope),
        (status = 409, description = "Duplicate code_formation", body = ErrorEnvelope)
    )
)]
pub async fn update_programme(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateProgrammeRequest>,
) -> ApiResult<Programme> {
    let mut programme = found(repo.get_programme(&id).await?, "programme")?;
    payload.apply(&mut programme, Utc::now());
    programme.validate()?;

    if !repo.replace_programme(&programme).await? {
        return Err(ApiError::not_found("programme"));
    }
    ok(programme)
}

#[utoipa::path(
    delete,
    path = "/api/programmes/{id}",
    params(("id" = String, Path, description = "Programme id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn delete_programme(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let removed = repo.delete_programme(&id).await?;
    if removed {
        tracing::info!(programme_id = %id, "programme deleted");
    }
    deleted(removed, id, "programme")
}
