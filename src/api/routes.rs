//! API route definitions

use axum::routing::{delete, get, post, put};
use axum::Router;

use super::handlers;
use super::server::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no auth required)
        .route("/health", get(handlers::health::health_check))
        // Session surface; /new-chat is the legacy spelling of the same operation
        .route("/chat/new-session", post(handlers::chat::new_session))
        .route("/chat/new-chat", post(handlers::chat::new_session))
        // Operational shutdown endpoint
        .route("/enginequits", post(handlers::lifecycle::engine_quit))
        // Auth routes
        .route("/api/auth/login", post(handlers::auth::login))
        // Protected routes
        .nest("/api", protected_routes())
        .with_state(state)
}

/// Routes that require authentication
fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(handlers::groups::list_groups))
        .route("/groups/:id", get(handlers::groups::get_group))
        .route("/groups/:id", put(handlers::groups::upsert_group))
        .route("/groups/:id", delete(handlers::groups::remove_group))
        .route("/groups/:id/pick", post(handlers::groups::pick_proxy))
}
