use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

pub mod routes;
use auth::AuthUser;
use error::ApiError;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, MongoRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document generated from the `#[utoipa::path]` annotations, served
/// at `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::liveness, handlers::health::readiness,
        handlers::programmes::list_public_programmes, handlers::programmes::get_public_programme,
        handlers::programmes::list_all_programmes, handlers::programmes::create_programme,
        handlers::programmes::update_programme, handlers::programmes::delete_programme,
        handlers::formations::list_formations, handlers::formations::get_formation,
        handlers::formations::create_formation, handlers::formations::update_formation,
        handlers::formations::delete_formation,
        handlers::apprenants::list_apprenants, handlers::apprenants::get_apprenant,
        handlers::apprenants::create_apprenant, handlers::apprenants::update_apprenant,
        handlers::apprenants::delete_apprenant,
        handlers::rendez_vous::get_creneaux, handlers::rendez_vous::book_rendez_vous,
        handlers::rendez_vous::submit_contact, handlers::rendez_vous::list_rendez_vous,
        handlers::rendez_vous::get_rendez_vous, handlers::rendez_vous::update_rendez_vous,
        handlers::rendez_vous::update_statut, handlers::rendez_vous::delete_rendez_vous,
        handlers::articles::list_blog, handlers::articles::get_blog_article,
        handlers::articles::list_all_articles, handlers::articles::create_article,
        handlers::articles::update_article, handlers::articles::delete_article,
        handlers::media::get_presigned_url, handlers::media::list_media,
        handlers::media::create_media, handlers::media::delete_media,
        handlers::stats::get_dashboard_stats,
        handlers::users::login, handlers::users::first_register, handlers::users::get_me,
        handlers::users::change_password, handlers::users::list_users,
        handlers::users::create_user, handlers::users::delete_user,
    ),
    components(
        schemas(
            models::Programme, models::ModuleFormation, models::Modalite,
            models::CreateProgrammeRequest, models::UpdateProgrammeRequest,
            models::FormationPersonnalisee, models::StatutFormation,
            models::CreateFormationRequest, models::UpdateFormationRequest,
            models::Apprenant, models::StatutApprenant, models::Financement,
            models::CreateApprenantRequest, models::UpdateApprenantRequest,
            models::RendezVous, models::TypeRendezVous, models::ModaliteRendezVous,
            models::StatutRendezVous, models::OrigineRendezVous,
            models::CreateRendezVousRequest, models::UpdateRendezVousRequest,
            models::UpdateStatutRequest, models::ContactRequest, models::Creneau,
            models::Article, models::StatutArticle,
            models::CreateArticleRequest, models::UpdateArticleRequest,
            models::Media, models::CreateMediaRequest,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::User, models::Role, models::LoginRequest, models::LoginResponse,
            models::CreateUserRequest, models::ChangePasswordRequest,
            models::DashboardStats, models::Pagination, models::ErrorEnvelope,
            handlers::Deleted, handlers::health::HealthStatus,
        )
    ),
    tags(
        (name = "formation-backoffice", description = "Training organization back office API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single container of shared services, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: MongoDB in deployment, in-memory for local runs and tests.
    pub repo: RepositoryState,
    /// Object storage for uploaded media.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for `authenticated_routes`: extracting `AuthUser` rejects the request
/// with the 401 envelope before any handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Gate for `admin_routes`: a valid session is not enough, the role must be `admin`.
async fn admin_middleware(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    auth_user.require_admin()?;
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the routers, their access layers, the observability stack and
/// the shared state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .merge(
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                admin_middleware,
            )),
        )
        .fallback(|| async { ApiError::NotFound("route not found".to_string()) })
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Tag every request with a UUID `x-request-id`.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. One span per request, carrying the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo the id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span: method, uri and the `x-request-id` set above,
/// so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
