use crate::{
    AppState,
    handlers::{articles, health, programmes, rendez_vous, users},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Routes open to anonymous visitors: the marketing site (catalogue, blog,
/// booking calendar, contact form) and the login/bootstrap endpoints.
///
/// Every listing here is restricted to published records inside the handler,
/// whatever the query string asks for.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe; does not touch the database.
        .route("/health", get(health::liveness))
        // GET /api/health
        // Readiness probe; pings the store (503 when unreachable).
        .route("/api/health", get(health::readiness))
        // --- Catalogue ---
        .route("/api/programmes", get(programmes::list_public_programmes))
        .route("/api/programmes/{id}", get(programmes::get_public_programme))
        // --- Blog ---
        .route("/api/blog", get(articles::list_blog))
        .route("/api/blog/{slug}", get(articles::get_blog_article))
        // --- Booking & contact ---
        // GET /api/rendez-vous/creneaux?date=YYYY-MM-DD
        // The day's 30-minute slots with availability.
        .route("/api/rendez-vous/creneaux", get(rendez_vous::get_creneaux))
        .route("/api/rendez-vous", post(rendez_vous::book_rendez_vous))
        .route("/api/contact", post(rendez_vous::submit_contact))
        // --- Session ---
        .route("/api/users/login", post(users::login))
        // POST /api/users/first-register
        // Only usable while the users collection is empty.
        .route("/api/users/first-register", post(users::first_register))
}
