use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints answered by the gateway without touching the page renderer. None of these paths
/// match a guard rule, so they respond the same with or without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer liveness check.
        .route("/health", get(handlers::health))
        // GET /session
        // Reports the cookie-derived session (authenticated, username, admin flag, expiry).
        .route("/session", get(handlers::get_session))
}
