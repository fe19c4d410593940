use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::{Role, User},
    repository::RepositoryState,
};

/// PBKDF2 parameters used by Payload CMS, so accounts created by either side
/// can log in on the other.
pub const PBKDF2_ITERATIONS: u32 = 25_000;
pub const PBKDF2_KEY_LENGTH: usize = 512;

/// Cookie set by the Payload admin panel.
pub const TOKEN_COOKIE: &str = "payload-token";

/// Auth collection named in Payload session tokens.
pub const USERS_COLLECTION: &str = "users";

/// Claims
///
/// Session token payload. `sub` is the user id; the user is re-read on every
/// request so deleted accounts lose access immediately.
///
/// Payload signs `{ id, collection, email, iat, exp }`, so `id` is accepted
/// for `sub` and `collection` is carried when present.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "id")]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default)]
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl AuthUser {
    /// Fails with 403 unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }
}

/// AuthUser Extractor
///
/// Resolution order:
/// 1. `Env::Local` only: an `x-user-id` header naming an existing user.
/// 2. `Authorization: Bearer <token>` or `Authorization: JWT <token>`.
/// 3. The `payload-token` cookie.
///
/// Any failure rejects with 401. A store outage surfaces as 503 instead.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            if let Some(id) = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
            {
                if let Some(user) = repo.get_user(id).await? {
                    tracing::debug!(user_id = %user.id, "authenticated through local x-user-id bypass");
                    return Ok(AuthUser::from(&user));
                }
            }
        }

        let token = token_from_parts(parts).ok_or_else(unauthorized)?;

        let claims = decode_token(&token, &config.payload_secret).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            unauthorized()
        })?;

        if claims
            .collection
            .as_deref()
            .is_some_and(|collection| collection != USERS_COLLECTION)
        {
            tracing::debug!(collection = ?claims.collection, "token issued for another collection");
            return Err(unauthorized());
        }

        let user = repo.get_user(&claims.sub).await?.ok_or_else(unauthorized)?;

        Ok(AuthUser::from(&user))
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        AuthUser {
            id: user.id.clone(),
            role: user.role,
        }
    }
}

fn unauthorized() -> ApiError {
    ApiError::Unauthorized("authentication required".to_string())
}

/// Pulls the raw token from the Authorization header or the session cookie.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    if let Some(value) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("JWT "))
            .map(str::trim)
            .filter(|token| !token.is_empty());
        if token.is_some() {
            return token.map(str::to_string);
        }
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// Payload signs with the first 32 hex chars of sha256(secret), not the raw secret.
fn signing_key(secret: &str) -> Vec<u8> {
    let digest = hex::encode(Sha256::digest(secret.as_bytes()));
    digest.as_bytes()[..32].to_vec()
}

/// issue_token
///
/// Signs an HS256 session token for `user`. Returns the token and its expiry
/// as a unix timestamp.
pub fn issue_token(user: &User, config: &AppConfig) -> Result<(String, i64), ApiError> {
    let iat = Utc::now().timestamp();
    let exp = iat + config.token_expiration;
    let claims = Claims {
        sub: user.id.clone(),
        collection: Some(USERS_COLLECTION.to_string()),
        email: user.email.clone(),
        iat,
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(&signing_key(&config.payload_secret)),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;

    Ok((token, exp))
}

/// Validates signature and expiry.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(&signing_key(secret)),
        &validation,
    )
    .map(|data| data.claims)
}

/// 32 random bytes, hex encoded.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    hex::encode(bytes)
}

/// hash_password
///
/// PBKDF2-HMAC-SHA256 over the hex salt string, hex encoded.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut key = vec![0u8; PBKDF2_KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut key);
    hex::encode(key)
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let computed = hash_password(password, salt);
    constant_time_eq(computed.as_bytes(), expected_hash.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
