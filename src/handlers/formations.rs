use axum::extract::{Path, State};
use chrono::Utc;

use super::{ApiResult, Deleted, deleted, found, ok};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiQuery},
    models::{
        self, ApiResponse, CreateFormationRequest, ErrorEnvelope, FormationFilter,
        FormationPersonnalisee, PageRequest, UpdateFormationRequest,
    },
    repository::RepositoryState,
};

/// The learner, and the base programme when one is named, must exist.
async fn check_references(
    repo: &RepositoryState,
    formation: &FormationPersonnalisee,
) -> Result<(), ApiError> {
    if repo.get_apprenant(&formation.apprenant).await?.is_none() {
        return Err(ApiError::BadRequest(
            "`apprenant` does not reference an existing learner".to_string(),
        ));
    }
    if let Some(programme) = &formation.programme {
        if repo.get_programme(programme).await?.is_none() {
            return Err(ApiError::BadRequest(
                "`programme` does not reference an existing programme".to_string(),
            ));
        }
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/formations-personnalisees",
    params(FormationFilter),
    responses(
        (status = 200, description = "Tailored training plans", body = ApiResponse<Vec<FormationPersonnalisee>>),
        (status = 503, description = "Store unreachable", body = ErrorEnvelope)
    )
)]
pub async fn list_formations(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    ApiQuery(filter): ApiQuery<FormationFilter>,
) -> ApiResult<Vec<FormationPersonnalisee>> {
    let page = PageRequest::new(filter.page, filter.limit);
    let formations = repo.list_formations(&filter, page).await?;
    Ok(axum::Json(ApiResponse::paginated(formations, page)))
}

#[utoipa::path(
    get,
    path = "/api/formations-personnalisees/{id}",
    params(("id" = String, Path, description = "Training plan id")),
    responses(
        (status = 200, description = "Found", body = ApiResponse<FormationPersonnalisee>),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn get_formation(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<FormationPersonnalisee> {
    ok(found(repo.get_formation(&id).await?, "formation")?)
}

/// create_formation
///
/// [Authenticated Route] Builds a training plan for one learner, optionally
/// derived from a catalogue programme.
#[utoipa::path(
    post,
    path = "/api/formations-personnalisees",
    request_body = CreateFormationRequest,
    responses(
        (status = 200, description = "Created", body = ApiResponse<FormationPersonnalisee>),
        (status = 400, description = "Validation failed or dangling reference", body = ErrorEnvelope)
    )
)]
pub async fn create_formation(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    ApiJson(payload): ApiJson<CreateFormationRequest>,
) -> ApiResult<FormationPersonnalisee> {
    let formation = payload.into_formation(models::new_id(), Utc::now());
    formation.validate()?;
    check_references(&repo, &formation).await?;
    repo.insert_formation(&formation).await?;

    tracing::info!(formation_id = %formation.id, apprenant = %formation.apprenant, "formation created");
    ok(formation)
}

#[utoipa::path(
    put,
    path = "/api/formations-personnalisees/{id}",
    params(("id" = String, Path, description = "Training plan id")),
    request_body = UpdateFormationRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<FormationPersonnalisee>),
        (status = 400, description = "Validation failed or dangling reference", body = ErrorEnvelope),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn update_formation(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateFormationRequest>,
) -> ApiResult<FormationPersonnalisee> {
    let mut formation = found(repo.get_formation(&id).await?, "formation")?;
    payload.apply(&mut formation, Utc::now());
    formation.validate()?;
    check_references(&repo, &formation).await?;

    if !repo.replace_formation(&formation).await? {
        return Err(ApiError::not_found("formation"));
    }
    ok(formation)
}

#[utoipa::path(
    delete,
    path = "/api/formations-personnalisees/{id}",
    params(("id" = String, Path, description = "Training plan id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn delete_formation(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let removed = repo.delete_formation(&id).await?;
    deleted(removed, id, "formation")
}
