use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod models;
pub mod provisioning;
pub mod repository;
pub mod resources;
pub mod storage;
pub mod triggers;

// Route groups: the per-collection resource routers plus the few fixed endpoints.
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public, resources::resource_router};

// --- Public Re-exports ---

pub use auth::{JwtTokenVerifier, StaticTokenVerifier, TokenVerifierState};
pub use config::{AppConfig, Env};
pub use error::{ApiError, ApiResult};
pub use repository::{DocumentStoreState, InMemoryDocumentStore, PostgresDocumentStore};
pub use storage::{MockObjectStore, ObjectStoreState, S3ObjectStore};

/// AppState
///
/// The single state container shared by every request. Each collaborator sits behind
/// a trait object so tests can swap in the in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    /// Document store holding all five collections.
    pub store: DocumentStoreState,
    /// Object storage used for presigned media uploads.
    pub storage: ObjectStoreState,
    /// Identity collaborator behind the auth gate.
    pub verifier: TokenVerifierState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for DocumentStoreState {
    fn from_ref(app_state: &AppState) -> DocumentStoreState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for ObjectStoreState {
    fn from_ref(app_state: &AppState) -> ObjectStoreState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for TokenVerifierState {
    fn from_ref(app_state: &AppState) -> TokenVerifierState {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// The auth gate. Resolving `AuthUser` rejects the request with 401 before the inner
/// handler runs when the token is missing or fails verification. On success the
/// identity is attached to the request extensions for the handler.
pub async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    tracing::debug!(uid = %auth_user.uid, "request authenticated");
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// The API gateway: mounts one router per collection, the fixed endpoints and the docs,
/// then applies the observability and CORS layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let mut base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        );

    for spec in resources::RESOURCES.iter().copied() {
        base_router = base_router.merge(resource_router(spec, &state));
    }

    let base_router = base_router.with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`, tagging every log line of a request with its
/// `x-request-id`.
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
