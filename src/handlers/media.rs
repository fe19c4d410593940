use axum::extract::{Path, State};
use chrono::Utc;

use super::{ApiResult, Deleted, found, ok};
use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiQuery},
    models::{
        self, ApiResponse, CreateMediaRequest, ErrorEnvelope, Media, MediaFilter, PageRequest,
        PresignedUrlRequest, PresignedUrlResponse,
    },
    storage,
};

/// get_presigned_url
///
/// [Authenticated Route] Starts an upload. The browser PUTs the file straight
/// to object storage with the returned URL (valid 10 minutes), then registers
/// it through `POST /api/media` with `resource_key`.
#[utoipa::path(
    post,
    path = "/api/media/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "Upload URL issued", body = ApiResponse<PresignedUrlResponse>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
        (status = 500, description = "Storage failure", body = ErrorEnvelope)
    )
)]
pub async fn get_presigned_url(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PresignedUrlRequest>,
) -> ApiResult<PresignedUrlResponse> {
    if payload.filename.trim().is_empty() || payload.file_type.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "`filename` and `file_type` are required".to_string(),
        ));
    }

    let key = storage::upload_key(&payload.filename);
    let upload_url = state
        .storage
        .get_presigned_upload_url(&key, payload.file_type.trim())
        .await?;

    tracing::debug!(%user_id, %key, "presigned upload url issued");
    ok(PresignedUrlResponse {
        upload_url,
        resource_key: key,
    })
}

#[utoipa::path(
    get,
    path = "/api/media",
    params(MediaFilter),
    responses(
        (status = 200, description = "Uploaded documents", body = ApiResponse<Vec<Media>>),
        (status = 503, description = "Store unreachable", body = ErrorEnvelope)
    )
)]
pub async fn list_media(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<MediaFilter>,
) -> ApiResult<Vec<Media>> {
    let page = PageRequest::new(filter.page, filter.limit);
    let media = state.repo.list_media(&filter, page).await?;
    Ok(axum::Json(ApiResponse::paginated(media, page)))
}

#[utoipa::path(
    post,
    path = "/api/media",
    request_body = CreateMediaRequest,
    responses(
        (status = 200, description = "Registered", body = ApiResponse<Media>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope)
    )
)]
pub async fn create_media(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateMediaRequest>,
) -> ApiResult<Media> {
    payload.validate()?;
    let url = state.storage.public_url(&payload.resource_key);
    let media = payload.into_media(models::new_id(), url, Some(user_id), Utc::now());
    state.repo.insert_media(&media).await?;

    tracing::info!(media_id = %media.id, key = %media.storage_key, "media registered");
    ok(media)
}

/// delete_media
///
/// [Authenticated Route] Removes the record, then the stored object. A storage
/// failure is logged only: the record stays deleted and the object becomes an
/// orphan for the bucket lifecycle rules to collect.
#[utoipa::path(
    delete,
    path = "/api/media/{id}",
    params(("id" = String, Path, description = "Media id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn delete_media(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let media = found(state.repo.get_media(&id).await?, "media")?;

    if !state.repo.delete_media(&media.id).await? {
        return Err(ApiError::not_found("media"));
    }

    if let Err(e) = state.storage.delete_object(&media.storage_key).await {
        tracing::warn!(media_id = %media.id, key = %media.storage_key, error = %e, "stored object not deleted");
    }

    ok(Deleted { id: media.id })
}
