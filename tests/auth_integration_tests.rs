use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, header, request::Parts},
};
use chrono::Utc;
use formation_backoffice::{
    AppConfig, AppState, InMemoryRepository, MockStorageService,
    auth::{self, AuthUser, Claims},
    config::Env,
    models::{self, Role, StoredUser, User},
    repository::Repository,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;

const TEST_SECRET: &str = "test-secret";

// --- Test Utilities ---

fn test_user(role: Role) -> User {
    let now = Utc::now();
    User {
        id: models::new_id(),
        email: format!("{}@organisme.fr", models::new_id()),
        nom: Some("Martin".to_string()),
        prenom: Some("Claire".to_string()),
        role,
        created_at: now,
        updated_at: now,
    }
}

async fn seeded_repo(users: &[&User]) -> Arc<InMemoryRepository> {
    let repo = Arc::new(InMemoryRepository::new());
    for user in users {
        let salt = auth::generate_salt();
        let hash = auth::hash_password("motdepasse", &salt);
        repo.insert_user(&StoredUser {
            user: (*user).clone(),
            salt,
            hash,
        })
        .await
        .unwrap();
    }
    repo
}

fn app_state(env: Env, repo: Arc<InMemoryRepository>) -> AppState {
    let mut config = AppConfig::default();
    config.env = env;
    config.payload_secret = TEST_SECRET.to_string();

    AppState {
        repo,
        storage: Arc::new(MockStorageService::new()),
        config,
    }
}

fn request_parts(headers: &[(&str, String)]) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri("/");
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

async fn extract(state: &AppState, headers: &[(&str, String)]) -> Result<AuthUser, StatusCode> {
    let mut parts = request_parts(headers);
    AuthUser::from_request_parts(&mut parts, state)
        .await
        .map_err(|e| e.status())
}

// --- Password hashing ---

#[test]
fn test_hash_matches_payload_vector() {
    // Reference PBKDF2-HMAC-SHA256 output for Payload's parameters (25000 rounds, 512 bytes).
    let salt = "5f1d3c2b9a8e7d6c5b4a39281706f5e4d3c2b1a09f8e7d6c5b4a392817060504";
    let hash = auth::hash_password("Formation2024!", salt);

    assert_eq!(hash.len(), 1024);
    assert!(hash.starts_with("2c565f8a6ab68a95ed858c3bcd64dc9ba0fce34d5e43761765e17d2d06612e0c"));
    assert!(hash.ends_with("bb4d74d460ec6e898c248a46fa4e58e8"));
    assert!(auth::verify_password("Formation2024!", salt, &hash));
}

#[test]
fn test_verify_rejects_wrong_password() {
    let salt = auth::generate_salt();
    let hash = auth::hash_password("correct horse", &salt);

    assert!(auth::verify_password("correct horse", &salt, &hash));
    assert!(!auth::verify_password("correct horsE", &salt, &hash));
    assert!(!auth::verify_password("correct horse", &auth::generate_salt(), &hash));
    assert!(!auth::verify_password("correct horse", &salt, "deadbeef"));
}

#[test]
fn test_salt_is_32_random_bytes_hex() {
    let salt = auth::generate_salt();
    assert_eq!(salt.len(), 64);
    assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(salt, auth::generate_salt());
}

// --- Tokens ---

#[test]
fn test_issue_and_decode_token() {
    let user = test_user(Role::Editor);
    let mut config = AppConfig::default();
    config.payload_secret = TEST_SECRET.to_string();

    let before = Utc::now().timestamp();
    let (token, exp) = auth::issue_token(&user, &config).unwrap();
    let claims = auth::decode_token(&token, TEST_SECRET).unwrap();

    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.email, user.email);
    assert_eq!(claims.exp, exp);
    assert!(exp >= before + config.token_expiration);
}

#[test]
fn test_token_signed_with_another_secret_is_rejected() {
    let user = test_user(Role::Editor);
    let mut config = AppConfig::default();
    config.payload_secret = "some-other-secret".to_string();

    let (token, _) = auth::issue_token(&user, &config).unwrap();
    assert!(auth::decode_token(&token, TEST_SECRET).is_err());
}

/// Signs a claim set the way the Payload admin panel does.
fn payload_token(claims: &serde_json::Value) -> String {
    // Payload signs with the first 32 hex chars of sha256(secret).
    let key = &hex::encode(Sha256::digest(TEST_SECRET.as_bytes()))[..32];
    assert_eq!(key, "9caf06bb4436cdbfa20af9121a626bc1");

    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_accepts_tokens_signed_like_payload() {
    let id = models::new_id();
    let now = Utc::now().timestamp();
    let token = payload_token(&json!({
        "id": id,
        "collection": "users",
        "email": "admin@organisme.fr",
        "iat": now,
        "exp": now + 60,
    }));

    let claims = auth::decode_token(&token, TEST_SECRET).unwrap();
    assert_eq!(claims.sub, id);
    assert_eq!(claims.collection.as_deref(), Some("users"));
    assert_eq!(claims.email, "admin@organisme.fr");
}

#[test]
fn test_issued_tokens_name_the_users_collection() {
    let user = test_user(Role::Admin);
    let (token, _) = auth::issue_token(&user, &AppConfig {
        payload_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    })
    .unwrap();

    let claims: Claims = auth::decode_token(&token, TEST_SECRET).unwrap();
    assert_eq!(claims.collection.as_deref(), Some(auth::USERS_COLLECTION));
}

// --- AuthUser extractor ---

#[tokio::test]
async fn test_auth_success_with_bearer_token() {
    let user = test_user(Role::Editor);
    let state = app_state(Env::Production, seeded_repo(&[&user]).await);
    let (token, _) = auth::issue_token(&user, &state.config).unwrap();

    let auth_user = extract(&state, &[("authorization", format!("Bearer {token}"))])
        .await
        .unwrap();

    assert_eq!(auth_user.id, user.id);
    assert_eq!(auth_user.role, Role::Editor);
}

#[tokio::test]
async fn test_auth_success_with_jwt_scheme() {
    let user = test_user(Role::Admin);
    let state = app_state(Env::Production, seeded_repo(&[&user]).await);
    let (token, _) = auth::issue_token(&user, &state.config).unwrap();

    let auth_user = extract(&state, &[("authorization", format!("JWT {token}"))])
        .await
        .unwrap();

    assert_eq!(auth_user.role, Role::Admin);
}

#[tokio::test]
async fn test_auth_success_with_payload_cookie() {
    let user = test_user(Role::Editor);
    let state = app_state(Env::Production, seeded_repo(&[&user]).await);
    let (token, _) = auth::issue_token(&user, &state.config).unwrap();

    let cookie = format!("theme=dark; payload-token={token}; lang=fr");
    let auth_user = extract(&state, &[(header::COOKIE.as_str(), cookie)])
        .await
        .unwrap();

    assert_eq!(auth_user.id, user.id);
}

#[tokio::test]
async fn test_auth_with_payload_session_cookie() {
    let user = test_user(Role::Admin);
    let state = app_state(Env::Production, seeded_repo(&[&user]).await);
    let now = Utc::now().timestamp();

    let token = payload_token(&json!({
        "id": user.id,
        "collection": "users",
        "email": user.email,
        "iat": now,
        "exp": now + 60,
    }));
    let auth_user = extract(&state, &[(header::COOKIE.as_str(), format!("payload-token={token}"))])
        .await
        .unwrap();
    assert_eq!(auth_user.id, user.id);
    assert_eq!(auth_user.role, Role::Admin);

    // Sessions of another auth collection never map onto a back-office user.
    let foreign = payload_token(&json!({
        "id": user.id,
        "collection": "customers",
        "email": user.email,
        "iat": now,
        "exp": now + 60,
    }));
    assert_eq!(
        extract(&state, &[("authorization", format!("JWT {foreign}"))])
            .await
            .unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let state = app_state(Env::Production, seeded_repo(&[]).await);
    assert_eq!(extract(&state, &[]).await.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_unknown_scheme() {
    let user = test_user(Role::Editor);
    let state = app_state(Env::Production, seeded_repo(&[&user]).await);
    let (token, _) = auth::issue_token(&user, &state.config).unwrap();

    let result = extract(&state, &[("authorization", format!("Token {token}"))]).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    let user = test_user(Role::Editor);
    let state = app_state(Env::Production, seeded_repo(&[&user]).await);

    let mut expired = state.config.clone();
    expired.token_expiration = -120;
    let (token, _) = auth::issue_token(&user, &expired).unwrap();

    let result = extract(&state, &[("authorization", format!("Bearer {token}"))]).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_for_deleted_user() {
    let user = test_user(Role::Editor);
    let repo = seeded_repo(&[&user]).await;
    let state = app_state(Env::Production, repo.clone());
    let (token, _) = auth::issue_token(&user, &state.config).unwrap();

    assert!(repo.delete_user(&user.id).await.unwrap());

    let result = extract(&state, &[("authorization", format!("Bearer {token}"))]).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_reports_unreachable_store() {
    let user = test_user(Role::Editor);
    let repo = seeded_repo(&[&user]).await;
    let state = app_state(Env::Production, repo.clone());
    let (token, _) = auth::issue_token(&user, &state.config).unwrap();

    repo.set_available(false);

    let result = extract(&state, &[("authorization", format!("Bearer {token}"))]).await;
    assert_eq!(result.unwrap_err(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let user = test_user(Role::Admin);
    let state = app_state(Env::Local, seeded_repo(&[&user]).await);

    let auth_user = extract(&state, &[("x-user-id", user.id.clone())]).await.unwrap();

    assert_eq!(auth_user.id, user.id);
    assert_eq!(auth_user.role, Role::Admin);
}

#[tokio::test]
async fn test_local_bypass_unknown_user_falls_through() {
    let state = app_state(Env::Local, seeded_repo(&[]).await);

    let result = extract(&state, &[("x-user-id", models::new_id())]).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let user = test_user(Role::Admin);
    let state = app_state(Env::Production, seeded_repo(&[&user]).await);

    let result = extract(&state, &[("x-user-id", user.id.clone())]).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_require_admin() {
    let admin = AuthUser {
        id: models::new_id(),
        role: Role::Admin,
    };
    let editor = AuthUser {
        id: models::new_id(),
        role: Role::Editor,
    };

    assert!(admin.require_admin().is_ok());
    assert_eq!(
        editor.require_admin().unwrap_err().status(),
        StatusCode::FORBIDDEN
    );
}
