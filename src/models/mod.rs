//! Record shapes for every collection, plus the request/response payloads and
//! list filters built on them.
//!
//! Records carry their id as a 24-hex ObjectId string so the same type serves
//! the JSON API, the in-memory repository and the MongoDB documents (where the
//! id is mapped to `_id`).

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

pub mod apprenant;
pub mod article;
pub mod envelope;
pub mod formation;
pub mod media;
pub mod programme;
pub mod rendez_vous;
pub mod user;

pub use apprenant::{
    Apprenant, ApprenantFilter, CreateApprenantRequest, Financement, StatutApprenant,
    UpdateApprenantRequest,
};
pub use article::{
    Article, ArticleFilter, CreateArticleRequest, StatutArticle, UpdateArticleRequest,
    reading_time, slugify,
};
pub use envelope::{ApiResponse, ErrorEnvelope, Page, PageRequest, Pagination};
pub use formation::{
    CreateFormationRequest, FormationFilter, FormationPersonnalisee, StatutFormation,
    UpdateFormationRequest,
};
pub use media::{CreateMediaRequest, Media, MediaFilter, PresignedUrlRequest, PresignedUrlResponse};
pub use programme::{
    CreateProgrammeRequest, Modalite, ModuleFormation, Programme, ProgrammeFilter,
    UpdateProgrammeRequest,
};
pub use rendez_vous::{
    ContactRequest, CreateRendezVousRequest, Creneau, CreneauxQuery, ModaliteRendezVous,
    OrigineRendezVous, RendezVous, RendezVousFilter, StatutRendezVous, TypeRendezVous,
    UpdateRendezVousRequest, UpdateStatutRequest,
};
pub use user::{
    ChangePasswordRequest, CreateUserRequest, LoginRequest, LoginResponse, Role, StoredUser, User,
};

/// Generates a fresh record id (ObjectId hex), shared by both repositories.
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// Returns true when `id` is a well-formed ObjectId. Malformed ids are treated
/// as "not found" by the handlers.
pub fn is_valid_id(id: &str) -> bool {
    ObjectId::parse_str(id).is_ok()
}

/// DashboardStats
///
/// Counters shown on the admin dashboard (GET /api/admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct DashboardStats {
    pub total_programmes: u64,
    pub programmes_publies: u64,
    pub total_apprenants: u64,
    pub apprenants_en_formation: u64,
    pub formations_en_cours: u64,
    pub rendez_vous_en_attente: u64,
    /// Non-cancelled appointments dated today or later.
    pub rendez_vous_a_venir: u64,
    pub articles_publies: u64,
    pub total_media: u64,
}

// --- Validation helpers shared by the record types ---

pub(crate) fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("`{field}` is required")));
    }
    Ok(())
}

pub(crate) fn require_email(field: &str, value: &str) -> Result<(), ApiError> {
    require(field, value)?;
    let valid = value
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        });
    if !valid || value.chars().any(char::is_whitespace) {
        return Err(ApiError::BadRequest(format!("`{field}` is not a valid email address")));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: f64) -> Result<(), ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::BadRequest(format!("`{field}` must be a positive number")));
    }
    Ok(())
}

pub(crate) fn require_reference(field: &str, value: &str) -> Result<(), ApiError> {
    if !is_valid_id(value) {
        return Err(ApiError::BadRequest(format!("`{field}` is not a valid reference")));
    }
    Ok(())
}

/// Trims an optional string and drops it when it ends up empty.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
