use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use super::{clean, normalize_email, require_email};
use crate::error::ApiError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Role
///
/// RBAC field. `admin` manages accounts; `editor` runs the day-to-day back office.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    Editor,
}

/// User
///
/// A back-office account from the `users` collection, as exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Default)]
#[ts(export)]
pub struct User {
    pub id: String,
    /// Unique, stored lower-cased.
    pub email: String,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// StoredUser
///
/// The persisted form of a user: the profile plus the PBKDF2 `salt` and `hash`.
/// Never serialized into an API response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredUser {
    #[serde(flatten)]
    pub user: User,
    pub salt: String,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// `exp` is the token expiry as a unix timestamp (seconds).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub exp: i64,
    pub user: User,
}

/// CreateUserRequest
///
/// Payload for POST /api/users (admin) and POST /api/users/first-register.
/// `role` is ignored by first-register, which always creates an admin.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_email("email", self.email.trim())?;
        check_password(&self.password)
    }

    pub fn into_user(self, id: String, now: DateTime<Utc>) -> User {
        User {
            id,
            email: normalize_email(&self.email),
            nom: clean(self.nom),
            prenom: clean(self.prenom),
            role: self.role,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub fn check_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "`password` must contain at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
