use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated endpoints that belong to no resource collection. Collection reads
/// that are public are mounted by the resource router factory instead.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and uptime checks.
        .route("/health", get(|| async { "ok" }))
}
