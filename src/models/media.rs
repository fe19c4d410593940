use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use super::{clean, require};
use crate::{error::ApiError, storage};

/// Media
///
/// An uploaded document or image from the `media` collection. The binary lives
/// in object storage under `storage_key`; `url` is its public address.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct Media {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default)]
    pub alt: Option<String>,
    pub storage_key: String,
    pub url: String,
    /// User id of the uploader.
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL (POST /api/media/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "plaquette_excel.pdf")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "application/pdf")]
    pub file_type: String,
}

/// PresignedUrlResponse
///
/// The time-limited PUT URL and the object key to reference once the upload completes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub resource_key: String,
}

/// CreateMediaRequest
///
/// Registers an uploaded object (POST /api/media) after the client finished the presigned PUT.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateMediaRequest {
    pub filename: String,
    pub mime_type: String,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default)]
    pub alt: Option<String>,
    pub resource_key: String,
}

impl CreateMediaRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("filename", &self.filename)?;
        require("mime_type", &self.mime_type)?;
        require("resource_key", &self.resource_key)?;
        if !storage::is_upload_key(&self.resource_key) {
            return Err(ApiError::BadRequest(
                "`resource_key` must reference an uploaded object".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_media(
        self,
        id: String,
        url: String,
        uploaded_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Media {
        Media {
            id,
            filename: self.filename.trim().to_string(),
            mime_type: self.mime_type.trim().to_string(),
            filesize: self.filesize,
            alt: clean(self.alt),
            storage_key: self.resource_key,
            url,
            uploaded_by,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct MediaFilter {
    /// Prefix match on the MIME type, e.g. "image/" or "application/pdf".
    pub mime_type: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
