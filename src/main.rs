use portfolio_api::{
    AppState, JwtTokenVerifier,
    config::{AppConfig, Env},
    create_router,
    repository::{DocumentStoreState, InMemoryDocumentStore, PostgresDocumentStore},
    storage::{ObjectStore, ObjectStoreState, S3ObjectStore},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, wires the document store, object storage
/// and token verifier into the shared state, then serves the gateway.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise the local-debug defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portfolio_api=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Document store
    let store: DocumentStoreState = match config.db_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

            let pg = PostgresDocumentStore::new(pool);
            pg.ensure_schema()
                .await
                .expect("FATAL: Failed to create the documents table.");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; documents are kept in memory and lost on exit");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    // 4. Object storage (S3/MinIO)
    let s3 = S3ObjectStore::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
        &config.s3_public_url,
    );

    // LOCAL-ONLY: create the MinIO bucket on first run.
    if config.env == Env::Local {
        s3.ensure_bucket_exists().await;
    }
    let storage = Arc::new(s3) as ObjectStoreState;

    // 5. Token verification
    let verifier = Arc::new(JwtTokenVerifier::with_audience(
        &config.jwt_secret,
        &config.jwt_audience,
    ));

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        store,
        storage,
        verifier,
        config,
    };

    // 6. Router and server startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: Failed to bind {}: {}", bind_addr, e));

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app).await.expect("FATAL: HTTP server error");
}
