use axum::extract::{Path, State};
use chrono::Utc;

use super::{ApiResult, Deleted, deleted, found, ok};
use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{ApiError, RepoError},
    extract::ApiJson,
    models::{
        self, ApiResponse, ChangePasswordRequest, CreateUserRequest, ErrorEnvelope, LoginRequest,
        LoginResponse, Role, StoredUser, User, user::check_password,
    },
    repository::{FIRST_USER, RepositoryState},
};

/// Hashes the password and wraps the profile for persistence.
fn with_credentials(user: User, password: &str) -> StoredUser {
    let salt = auth::generate_salt();
    let hash = auth::hash_password(password, &salt);
    StoredUser { user, salt, hash }
}

fn registration_closed() -> ApiError {
    ApiError::Forbidden("first registration is closed: users already exist".to_string())
}

fn bad_credentials() -> ApiError {
    ApiError::Unauthorized("invalid email or password".to_string())
}

/// login
///
/// [Public Route] Exchanges email and password for a session token. Unknown
/// email and wrong password are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Bad credentials", body = ErrorEnvelope)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let stored = state
        .repo
        .find_user_by_email(&payload.email)
        .await?
        .ok_or_else(bad_credentials)?;

    if !auth::verify_password(&payload.password, &stored.salt, &stored.hash) {
        tracing::info!(user_id = %stored.user.id, "login rejected");
        return Err(bad_credentials());
    }

    let (token, exp) = auth::issue_token(&stored.user, &state.config)?;
    tracing::info!(user_id = %stored.user.id, "user logged in");
    ok(LoginResponse {
        token,
        exp,
        user: stored.user,
    })
}

/// first_register
///
/// [Public Route] Bootstraps the back office: creates the first account as an
/// admin and logs it in. Closed (403) as soon as any user exists.
#[utoipa::path(
    post,
    path = "/api/users/first-register",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "First admin created", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
        (status = 403, description = "Users already exist", body = ErrorEnvelope)
    )
)]
pub async fn first_register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<LoginResponse> {
    if state.repo.count_users().await? > 0 {
        return Err(registration_closed());
    }
    payload.validate()?;

    let password = payload.password.clone();
    let mut user = payload.into_user(models::new_id(), Utc::now());
    user.role = Role::Admin;

    state
        .repo
        .insert_first_user(&with_credentials(user.clone(), &password))
        .await
        .map_err(|err| match err {
            RepoError::Duplicate { field } if field == FIRST_USER => registration_closed(),
            other => other.into(),
        })?;

    let (token, exp) = auth::issue_token(&user, &state.config)?;
    tracing::info!(user_id = %user.id, "first admin registered");
    ok(LoginResponse { token, exp, user })
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope)
    )
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(repo): State<RepositoryState>,
) -> ApiResult<User> {
    ok(found(repo.get_user(&id).await?, "user")?)
}

/// change_password
///
/// [Authenticated Route] Requires the current password; the new one gets a
/// fresh salt.
#[utoipa::path(
    put,
    path = "/api/users/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<User>),
        (status = 400, description = "Wrong current password or weak new one", body = ErrorEnvelope)
    )
)]
pub async fn change_password(
    AuthUser { id, .. }: AuthUser,
    State(repo): State<RepositoryState>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ApiResult<User> {
    let stored = found(repo.get_user_credentials(&id).await?, "user")?;

    if !auth::verify_password(&payload.current_password, &stored.salt, &stored.hash) {
        return Err(ApiError::BadRequest(
            "`current_password` is incorrect".to_string(),
        ));
    }
    check_password(&payload.new_password)?;

    let salt = auth::generate_salt();
    let hash = auth::hash_password(&payload.new_password, &salt);
    if !repo.update_user_password(&id, &salt, &hash).await? {
        return Err(ApiError::not_found("user"));
    }

    tracing::info!(user_id = %id, "password changed");
    ok(stored.user)
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All accounts", body = ApiResponse<Vec<User>>),
        (status = 403, description = "Admin role required", body = ErrorEnvelope)
    )
)]
pub async fn list_users(
    user: AuthUser,
    State(repo): State<RepositoryState>,
) -> ApiResult<Vec<User>> {
    user.require_admin()?;
    ok(repo.list_users().await?)
}

/// create_user
///
/// [Admin Route] Creates a back-office account with the requested role.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Created", body = ApiResponse<User>),
        (status = 403, description = "Admin role required", body = ErrorEnvelope),
        (status = 409, description = "Email already registered", body = ErrorEnvelope)
    )
)]
pub async fn create_user(
    admin: AuthUser,
    State(repo): State<RepositoryState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<User> {
    admin.require_admin()?;
    payload.validate()?;

    let password = payload.password.clone();
    let user = payload.into_user(models::new_id(), Utc::now());
    repo.insert_user(&with_credentials(user.clone(), &password))
        .await?;

    tracing::info!(user_id = %user.id, role = ?user.role, created_by = %admin.id, "user created");
    ok(user)
}

/// delete_user
///
/// [Admin Route] An admin cannot delete their own account (409).
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 403, description = "Admin role required", body = ErrorEnvelope),
        (status = 404, description = "Not found", body = ErrorEnvelope),
        (status = 409, description = "Self-deletion", body = ErrorEnvelope)
    )
)]
pub async fn delete_user(
    admin: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    admin.require_admin()?;
    if admin.id == id {
        return Err(ApiError::Conflict(
            "you cannot delete your own account".to_string(),
        ));
    }

    let removed = repo.delete_user(&id).await?;
    if removed {
        tracing::info!(user_id = %id, deleted_by = %admin.id, "user deleted");
    }
    deleted(removed, id, "user")
}
