use crate::{
    AppState,
    handlers::{apprenants, articles, formations, media, programmes, rendez_vous, stats, users},
};
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

/// Authenticated Router Module
///
/// The back office: everything an `editor` or `admin` account can do.
///
/// The router is wrapped in the authentication `route_layer` in `create_router`,
/// and each handler also takes `AuthUser`, so a request without a valid
/// session never reaches business logic.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Session ---
        .route("/api/users/me", get(users::get_me))
        .route("/api/users/me/password", put(users::change_password))
        // GET /api/admin/stats
        // Dashboard counters.
        .route("/api/admin/stats", get(stats::get_dashboard_stats))
        // --- Programmes ---
        // Listing with drafts lives under /api/admin; the public GETs on the same
        // paths are declared in the public router.
        .route("/api/admin/programmes", get(programmes::list_all_programmes))
        .route("/api/programmes", post(programmes::create_programme))
        .route(
            "/api/programmes/{id}",
            put(programmes::update_programme).delete(programmes::delete_programme),
        )
        // --- Formations personnalisées ---
        .route(
            "/api/formations-personnalisees",
            get(formations::list_formations).post(formations::create_formation),
        )
        .route(
            "/api/formations-personnalisees/{id}",
            get(formations::get_formation)
                .put(formations::update_formation)
                .delete(formations::delete_formation),
        )
        // --- Apprenants ---
        .route(
            "/api/apprenants-payload",
            get(apprenants::list_apprenants).post(apprenants::create_apprenant),
        )
        .route(
            "/api/apprenants-payload/{id}",
            get(apprenants::get_apprenant)
                .put(apprenants::update_apprenant)
                .delete(apprenants::delete_apprenant),
        )
        // --- Rendez-vous ---
        .route("/api/rendez-vous", get(rendez_vous::list_rendez_vous))
        .route(
            "/api/rendez-vous/{id}",
            get(rendez_vous::get_rendez_vous)
                .put(rendez_vous::update_rendez_vous)
                .delete(rendez_vous::delete_rendez_vous),
        )
        // PATCH /api/rendez-vous/{id}/statut
        // Lifecycle transitions; illegal moves answer 409.
        .route("/api/rendez-vous/{id}/statut", patch(rendez_vous::update_statut))
        // --- Articles ---
        .route("/api/admin/articles", get(articles::list_all_articles))
        .route("/api/articles", post(articles::create_article))
        .route(
            "/api/articles/{id}",
            put(articles::update_article).delete(articles::delete_article),
        )
        // --- Media ---
        // POST /api/media/presigned
        // Short-lived (10-minute) PUT URL for a direct-to-bucket upload.
        .route("/api/media/presigned", post(media::get_presigned_url))
        .route("/api/media", get(media::list_media).post(media::create_media))
        .route("/api/media/{id}", delete(media::delete_media))
}
