use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use formation_backoffice::{
    AppConfig, AppState, InMemoryRepository, MockStorageService, create_router,
    storage::StorageState,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::util::ServiceExt;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryRepository>,
}

fn test_state(repo: Arc<InMemoryRepository>) -> AppState {
    AppState {
        repo,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        config: AppConfig::default(),
    }
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let router = create_router(test_state(repo.clone()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

/// Registers the first admin and returns its bearer token.
async fn bootstrap_admin(app: &TestApp, client: &reqwest::Client) -> String {
    let response = client
        .post(format!("{}/api/users/first-register", app.address))
        .json(&json!({
            "email": "direction@organisme.fr",
            "password": "motdepasse-admin",
            "nom": "Garnier"
        }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    body["data"]["token"].as_str().unwrap().to_string()
}

fn next_weekday() -> NaiveDate {
    let mut date = Local::now().date_naive() + Duration::days(7);
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += Duration::days(1);
    }
    date
}

async fn oneshot_json(router: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body_bytes).unwrap_or(Value::Null))
}

// --- Probes ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let response = client
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "connected");
}

#[tokio::test]
async fn test_unreachable_store_answers_503() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    app.repo.set_available(false);

    for path in ["/api/health", "/api/programmes", "/api/blog"] {
        let response = client
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .expect("req fail");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{path}");

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}

// --- Envelope & routing ---

#[tokio::test]
async fn test_public_listing_envelope() {
    let router = create_router(test_state(Arc::new(InMemoryRepository::new())));

    let request = Request::builder()
        .uri("/api/programmes?page=2&limit=5")
        .body(Body::empty())
        .unwrap();
    let (status, body) = oneshot_json(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 5);
    assert_eq!(body["pagination"]["total_docs"], 0);
    assert_eq!(body["pagination"]["has_prev_page"], true);
}

#[tokio::test]
async fn test_listing_past_the_last_page() {
    let router = create_router(test_state(Arc::new(InMemoryRepository::new())));

    let request = Request::builder()
        .uri("/api/blog?page=18446744073709551615&limit=100")
        .body(Body::empty())
        .unwrap();
    let (status, body) = oneshot_json(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["has_next_page"], false);
}

#[tokio::test]
async fn test_unknown_route_returns_envelope() {
    let router = create_router(test_state(Arc::new(InMemoryRepository::new())));

    let request = Request::builder()
        .uri("/api/inexistant")
        .body(Body::empty())
        .unwrap();
    let (status, body) = oneshot_json(router, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let router = create_router(test_state(Arc::new(InMemoryRepository::new())));

    for (method, uri) in [
        ("GET", "/api/admin/stats"),
        ("GET", "/api/rendez-vous"),
        ("POST", "/api/programmes"),
        ("GET", "/api/apprenants-payload"),
        ("GET", "/api/users"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = oneshot_json(router.clone(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_malformed_json_is_400_envelope() {
    let router = create_router(test_state(Arc::new(InMemoryRepository::new())));

    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"nom\": \"Dupont\""))
        .unwrap();
    let (status, body) = oneshot_json(router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// --- Session lifecycle ---

#[tokio::test]
async fn test_session_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let token = bootstrap_admin(&app, &client).await;

    // Bootstrap is closed once an account exists.
    let again = client
        .post(format!("{}/api/users/first-register", app.address))
        .json(&json!({ "email": "autre@organisme.fr", "password": "motdepasse-2" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(again.status(), StatusCode::FORBIDDEN);

    let wrong = client
        .post(format!("{}/api/users/login", app.address))
        .json(&json!({ "email": "direction@organisme.fr", "password": "nope" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let me = client
        .get(format!("{}/api/users/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("req fail");
    assert_eq!(me.status(), StatusCode::OK);
    let body: Value = me.json().await.unwrap();
    assert_eq!(body["data"]["email"], "direction@organisme.fr");
    assert_eq!(body["data"]["role"], "admin");
    assert!(body["data"].get("hash").is_none());
    assert!(body["data"].get("salt").is_none());

    let login = client
        .post(format!("{}/api/users/login", app.address))
        .json(&json!({ "email": "DIRECTION@organisme.fr", "password": "motdepasse-admin" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(login.status(), StatusCode::OK);

    // The Payload admin client sends its token in a cookie.
    let body: Value = login.json().await.unwrap();
    let cookie_token = body["data"]["token"].as_str().unwrap();
    let stats = client
        .get(format!("{}/api/admin/stats", app.address))
        .header("Cookie", format!("payload-token={cookie_token}"))
        .send()
        .await
        .expect("req fail");
    assert_eq!(stats.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_editor_cannot_manage_accounts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin_token = bootstrap_admin(&app, &client).await;

    let created = client
        .post(format!("{}/api/users", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({
            "email": "editeur@organisme.fr",
            "password": "motdepasse-editeur",
            "role": "editor"
        }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(created.status(), StatusCode::OK);

    let login: Value = client
        .post(format!("{}/api/users/login", app.address))
        .json(&json!({ "email": "editeur@organisme.fr", "password": "motdepasse-editeur" }))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();
    let editor_token = login["data"]["token"].as_str().unwrap();

    let listing = client
        .get(format!("{}/api/users", app.address))
        .bearer_auth(editor_token)
        .send()
        .await
        .expect("req fail");
    assert_eq!(listing.status(), StatusCode::FORBIDDEN);

    // The back office itself stays open to editors.
    let rdv = client
        .get(format!("{}/api/rendez-vous", app.address))
        .bearer_auth(editor_token)
        .send()
        .await
        .expect("req fail");
    assert_eq!(rdv.status(), StatusCode::OK);
}

// --- Catalogue & booking ---

#[tokio::test]
async fn test_programme_publication_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = bootstrap_admin(&app, &client).await;

    let created: Value = client
        .post(format!("{}/api/programmes", app.address))
        .bearer_auth(&token)
        .json(&json!({
            "code_formation": "bur-excel",
            "titre": "Excel perfectionnement",
            "duree_heures": 14,
            "modalite": "mixte"
        }))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();
    assert_eq!(created["data"]["code_formation"], "BUR-EXCEL");
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let public = client
        .get(format!("{}/api/programmes/{id}", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(public.status(), StatusCode::NOT_FOUND);

    let published = client
        .put(format!("{}/api/programmes/{id}", app.address))
        .bearer_auth(&token)
        .json(&json!({ "est_publie": true }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(published.status(), StatusCode::OK);

    let listing: Value = client
        .get(format!("{}/api/programmes?search=excel", app.address))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();
    assert_eq!(listing["data"][0]["id"], id.as_str());
    assert_eq!(listing["pagination"]["total_docs"], 1);

    let removed = client
        .delete(format!("{}/api/programmes/{id}", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("req fail");
    assert_eq!(removed.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_booking_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let date = next_weekday();

    let booking = json!({
        "nom": "Lefèvre",
        "email": "lefevre@example.fr",
        "type_rdv": "positionnement",
        "date": date.to_string(),
        "heure": "16:30",
        "modalite": "visio"
    });

    let first = client
        .post(format!("{}/api/rendez-vous", app.address))
        .json(&booking)
        .send()
        .await
        .expect("req fail");
    assert_eq!(first.status(), StatusCode::OK);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["data"]["statut"], "en_attente");

    let second = client
        .post(format!("{}/api/rendez-vous", app.address))
        .json(&booking)
        .send()
        .await
        .expect("req fail");
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let creneaux: Value = client
        .get(format!("{}/api/rendez-vous/creneaux?date={date}", app.address))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();
    let slot = creneaux["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["heure"] == "16:30")
        .unwrap()
        .clone();
    assert_eq!(slot["disponible"], false);

    let bad_date = client
        .get(format!("{}/api/rendez-vous/creneaux?date=demain", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);

    let missing_date = client
        .get(format!("{}/api/rendez-vous/creneaux", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(missing_date.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_form() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/contact", app.address))
        .json(&json!({
            "nom": "Fontaine",
            "email": "fontaine@example.fr",
            "message": "Quelles sont les dates de la prochaine session ?"
        }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["origine"], "contact");
    assert_eq!(body["data"]["type_rdv"], "information");

    let invalid = client
        .post(format!("{}/api/contact", app.address))
        .json(&json!({ "nom": "Fontaine", "email": "pas-un-email", "message": "Bonjour" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blog_only_serves_published_articles() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = bootstrap_admin(&app, &client).await;

    for (titre, statut) in [("Financer sa formation", "publie"), ("Brouillon interne", "brouillon")] {
        let response = client
            .post(format!("{}/api/articles", app.address))
            .bearer_auth(&token)
            .json(&json!({ "titre": titre, "contenu": "Texte", "statut": statut }))
            .send()
            .await
            .expect("req fail");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let blog: Value = client
        .get(format!("{}/api/blog?statut=brouillon", app.address))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();
    assert_eq!(blog["data"].as_array().unwrap().len(), 1);
    assert_eq!(blog["data"][0]["slug"], "financer-sa-formation");

    let draft = client
        .get(format!("{}/api/blog/brouillon-interne", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(draft.status(), StatusCode::NOT_FOUND);

    let admin_listing: Value = client
        .get(format!("{}/api/admin/articles", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();
    assert_eq!(admin_listing["pagination"]["total_docs"], 2);
}
