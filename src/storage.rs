use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// How long a presigned upload URL stays valid.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// StorageError
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to presign upload for '{key}': {reason}")]
    Presign { key: String, reason: String },

    #[error("object storage unavailable: {0}")]
    Unavailable(String),
}

/// PresignedUpload
///
/// A short-lived PUT target for one object key, plus the stable URL the object will be
/// readable at once uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub public_url: String,
}

// 1. ObjectStore Contract
/// ObjectStore
///
/// The media-storage collaborator. File bytes never pass through this service: clients
/// upload directly to the URL returned here and store the public URL on a document.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Ensures the configured bucket exists. Only used for local MinIO setups.
    async fn ensure_bucket_exists(&self);

    /// Presigns a PUT for `key`, constrained to `content_type`.
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<PresignedUpload, StorageError>;
}

/// ObjectStoreState
pub type ObjectStoreState = Arc<dyn ObjectStore>;

// 2. The Real Implementation (any S3-compatible endpoint)
/// S3ObjectStore
///
/// Talks to S3, R2 or MinIO. Path-style addressing is forced because MinIO and most
/// S3-compatible gateways require it.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: s3::Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_base_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    /// CreateBucket is idempotent for the owner, so the result is ignored.
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, "create_bucket: {:?}", e);
        }
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<PresignedUpload, StorageError> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| {
            StorageError::Presign {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            // The signature covers Content-Type, so the client cannot swap file types.
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(PresignedUpload {
            upload_url: presigned_req.uri().to_string(),
            public_url: format!("{}/{}", self.public_base_url, key),
        })
    }
}

/// sanitize_key
///
/// Drops empty, `.` and `..` segments so a client-supplied folder or filename cannot
/// escape its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. The Mock Implementation (For Tests)
/// MockObjectStore
///
/// Returns deterministic local-style URLs without touching the network.
#[derive(Clone, Default)]
pub struct MockObjectStore {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn ensure_bucket_exists(&self) {}

    async fn presign_upload(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<PresignedUpload, StorageError> {
        if self.should_fail {
            return Err(StorageError::Unavailable(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }

        let key = sanitize_key(key);

        Ok(PresignedUpload {
            upload_url: format!("http://localhost:9000/mock-bucket/{}?signature=fake", key),
            public_url: format!("http://localhost:9000/mock-bucket/{}", key),
        })
    }
}
