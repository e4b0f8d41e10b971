use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Authenticated Router Module
///
/// Gated endpoints outside the resource collections. The caller wraps this router in
/// the auth gate; handlers here may still take `AuthUser` to read the identity.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /uploads
        // Presigns a direct-to-storage upload. The returned public URL is what gets
        // written into a project, blog or photo document afterwards.
        .route("/uploads", post(handlers::create_upload))
}
