use std::env;

use crate::auth::DEFAULT_AUDIENCE;

/// Fallback signing secret for local runs. Never accepted in production.
pub const LOCAL_JWT_SECRET: &str = "portfolio-local-dev-secret-value";

/// AppConfig
///
/// Immutable once loaded and shared through the application state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and fail-fast rules.
    pub env: Env,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Postgres connection string. `None` selects the in-memory document store (local only).
    pub db_url: Option<String>,
    // Shared secret used to verify the identity provider's HS256 tokens.
    pub jwt_secret: String,
    // Audience expected in the provider's tokens.
    pub jwt_audience: String,
    // S3-compatible endpoint URL (MinIO locally).
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    // Bucket holding every uploaded media object.
    pub s3_bucket: String,
    // Base URL objects are publicly readable under.
    pub s3_public_url: String,
}

/// Env
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_audience: DEFAULT_AUDIENCE.to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "portfolio-test".to_string(),
            s3_public_url: "http://localhost:9000/portfolio-test".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `DATABASE_URL`, `JWT_SECRET`, `S3_ENDPOINT`,
    /// `S3_ACCESS_KEY` or `S3_SECRET_KEY` is missing, so the service never starts
    /// half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let jwt_audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| DEFAULT_AUDIENCE.to_string());
        let s3_bucket =
            env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "portfolio-media".to_string());

        match env {
            Env::Local => {
                let s3_endpoint = "http://localhost:9000".to_string();
                let s3_public_url = env::var("S3_PUBLIC_URL")
                    .unwrap_or_else(|_| format!("{}/{}", s3_endpoint, s3_bucket));

                Self {
                    env: Env::Local,
                    bind_addr,
                    // Local runs may skip Postgres entirely.
                    db_url: env::var("DATABASE_URL").ok(),
                    jwt_secret: env::var("JWT_SECRET")
                        .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                    jwt_audience,
                    s3_endpoint,
                    s3_region: "us-east-1".to_string(),
                    s3_key: "admin".to_string(),
                    s3_secret: "password".to_string(),
                    s3_bucket,
                    s3_public_url,
                }
            }
            Env::Production => {
                let s3_endpoint =
                    env::var("S3_ENDPOINT").expect("FATAL: S3_ENDPOINT required in prod");
                let s3_public_url = env::var("S3_PUBLIC_URL")
                    .unwrap_or_else(|_| format!("{}/{}", s3_endpoint, s3_bucket));

                Self {
                    env: Env::Production,
                    bind_addr,
                    db_url: Some(
                        env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                    ),
                    jwt_secret: env::var("JWT_SECRET")
                        .expect("FATAL: JWT_SECRET must be set in production."),
                    jwt_audience,
                    s3_endpoint,
                    s3_region: env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string()),
                    s3_key: env::var("S3_ACCESS_KEY")
                        .expect("FATAL: S3_ACCESS_KEY required in prod"),
                    s3_secret: env::var("S3_SECRET_KEY")
                        .expect("FATAL: S3_SECRET_KEY required in prod"),
                    s3_bucket,
                    s3_public_url,
                }
            }
        }
    }
}
