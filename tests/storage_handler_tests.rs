use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use formation_backoffice::{
    AppConfig, AppState, InMemoryRepository, create_router,
    models::{
        self, CreateMediaRequest, PresignedUrlRequest, Role, StoredUser, User,
    },
    repository::Repository,
    storage::MockStorageService,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

struct TestApp {
    router: axum::Router,
    repo: Arc<InMemoryRepository>,
    user_id: String,
}

async fn app(mock_storage: MockStorageService) -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());

    // The local x-user-id bypass only accepts existing accounts.
    let now = Utc::now();
    let user = User {
        id: models::new_id(),
        email: "media@organisme.fr".to_string(),
        nom: None,
        prenom: None,
        role: Role::Editor,
        created_at: now,
        updated_at: now,
    };
    repo.insert_user(&StoredUser {
        user: user.clone(),
        salt: String::new(),
        hash: String::new(),
    })
    .await
    .unwrap();

    let state = AppState {
        repo: repo.clone(),
        storage: Arc::new(mock_storage),
        config: AppConfig::default(),
    };

    TestApp {
        router: create_router(state),
        repo,
        user_id: user.id,
    }
}

async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("x-user-id", &app.user_id)
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body_bytes).unwrap())
}

fn presign_body(filename: &str, file_type: &str) -> Option<String> {
    let payload = PresignedUrlRequest {
        filename: filename.to_string(),
        file_type: file_type.to_string(),
    };
    Some(serde_json::to_string(&payload).unwrap())
}

#[tokio::test]
async fn test_presigned_url_success() {
    let app = app(MockStorageService::new()).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/media/presigned",
        presign_body("plaquette_excel.pdf", "application/pdf"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let key = body["data"]["resource_key"].as_str().unwrap();
    assert!(key.starts_with("uploads/"));
    assert!(key.ends_with(".pdf"));
    let url = body["data"]["upload_url"].as_str().unwrap();
    assert!(url.contains("signature=fake"));
    assert!(url.contains(key));
}

#[tokio::test]
async fn test_presigned_url_sanitization() {
    let app = app(MockStorageService::new()).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/media/presigned",
        presign_body("../../etc/passwd.exe", "application/octet-stream"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let key = body["data"]["resource_key"].as_str().unwrap();
    assert!(key.ends_with(".exe"));
    assert!(!key.contains(".."));
    assert!(!key.contains("passwd"));
}

#[tokio::test]
async fn test_presigned_url_requires_filename_and_type() {
    let app = app(MockStorageService::new()).await;

    let (status, body) = send(&app, "POST", "/api/media/presigned", presign_body(" ", "image/png")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_presigned_url_storage_failure() {
    let app = app(MockStorageService::new_failing()).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/media/presigned",
        presign_body("valid.mp4", "video/mp4"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_presigned_url_requires_session() {
    let app = app(MockStorageService::new()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/media/presigned")
        .header("Content-Type", "application/json")
        .body(Body::from(presign_body("a.png", "image/png").unwrap()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_and_list_media() {
    let app = app(MockStorageService::new()).await;

    let (_, presigned) = send(
        &app,
        "POST",
        "/api/media/presigned",
        presign_body("salle-formation.JPG", "image/jpeg"),
    )
    .await;
    let key = presigned["data"]["resource_key"].as_str().unwrap().to_string();

    let payload = CreateMediaRequest {
        filename: "salle-formation.jpg".to_string(),
        mime_type: "image/jpeg".to_string(),
        filesize: 48_213,
        alt: Some("Salle de formation".to_string()),
        resource_key: key.clone(),
    };
    let (status, body) = send(
        &app,
        "POST",
        "/api/media",
        Some(serde_json::to_string(&payload).unwrap()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["url"],
        format!("http://localhost:9000/mock-bucket/{key}").as_str()
    );
    assert_eq!(body["data"]["uploaded_by"], app.user_id.as_str());

    let (status, body) = send(&app, "GET", "/api/media?mime_type=image/jpeg", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total_docs"], 1);
}

#[tokio::test]
async fn test_register_media_rejects_foreign_keys() {
    let app = app(MockStorageService::new()).await;

    for key in [
        "../secrets/x.png",
        "uploads/programme.pdf",
        "uploads/../0b9e6a3c-5d47-4f1e-9a2b-7c8d9e0f1a2b.png",
        "uploads/0b9e6a3c5d474f1e9a2b7c8d9e0f1a2b.png",
        "autre/0b9e6a3c-5d47-4f1e-9a2b-7c8d9e0f1a2b.png",
    ] {
        let payload = CreateMediaRequest {
            filename: "x.png".to_string(),
            mime_type: "image/png".to_string(),
            resource_key: key.to_string(),
            ..Default::default()
        };
        let (status, _) = send(
            &app,
            "POST",
            "/api/media",
            Some(serde_json::to_string(&payload).unwrap()),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{key}");
    }
}

#[tokio::test]
async fn test_register_media_key_only_once() {
    let app = app(MockStorageService::new()).await;

    let payload = CreateMediaRequest {
        filename: "plaquette.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        resource_key: "uploads/0b9e6a3c-5d47-4f1e-9a2b-7c8d9e0f1a2b.pdf".to_string(),
        ..Default::default()
    };
    let body = Some(serde_json::to_string(&payload).unwrap());

    let (status, _) = send(&app, "POST", "/api/media", body.clone()).await;
    assert_eq!(status, StatusCode::OK);

    // A second record would let its deletion remove the first one's object.
    let (status, body) = send(&app, "POST", "/api/media", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_delete_media_survives_storage_failure() {
    let app = app(MockStorageService::new_failing()).await;

    let payload = CreateMediaRequest {
        filename: "programme.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        resource_key: "uploads/5f3c9d2e-8a41-4b6f-b1c7-2e9d0a4f6b83.pdf".to_string(),
        ..Default::default()
    };
    let (_, created) = send(
        &app,
        "POST",
        "/api/media",
        Some(serde_json::to_string(&payload).unwrap()),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "DELETE", &format!("/api/media/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert!(app.repo.get_media(&id).await.unwrap().is_none());

    let (status, _) = send(&app, "DELETE", &format!("/api/media/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
