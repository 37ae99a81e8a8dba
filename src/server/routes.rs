//! Router configuration for the relay.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::auth::{require_bearer, AuthState};
use super::handlers;
use super::AppState;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the router. Every route requires the bearer token.
pub fn create_router(state: AppState, auth: AuthState) -> Router {
    Router::new()
        .route("/scrape", post(handlers::scrape))
        .route("/status", get(handlers::status))
        .route("/sources", get(handlers::sources))
        .layer(middleware::from_fn_with_state(auth, require_bearer))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
