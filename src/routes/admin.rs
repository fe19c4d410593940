use crate::{AppState, handlers::users};
use axum::{
    Router,
    routing::{delete, get},
};

/// Admin Router Module
///
/// Account management, restricted to the `admin` role.
///
/// `create_router` wraps this router in the authentication layer and then the
/// admin check; the handlers repeat `require_admin()` so they stay safe if
/// mounted elsewhere.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /api/users
        .route("/api/users", get(users::list_users).post(users::create_user))
        // DELETE /api/users/{id}
        // Self-deletion answers 409.
        .route("/api/users/{id}", delete(users::delete_user))
}
