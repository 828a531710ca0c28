use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

/// StorageService
///
/// The abstract contract for the object-storage collaborator holding note images and
/// user avatars. The core never inspects image bytes: clients upload directly via a
/// presigned URL and hand back the durable URL, which is the only thing the store
/// keeps. The trait lets us swap the real S3 client for the in-memory mock in tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in the `Env::Local` setup to
    /// automatically provision the bucket in MinIO. No-op in production.
    async fn ensure_bucket_exists(&self);

    /// Generates a temporary, signed URL allowing a client to PUT one object directly
    /// into the bucket, constrained to the given content type and a short expiry.
    async fn presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String>;

    /// The durable, publicly readable URL for an uploaded object. This is the string
    /// persisted in a note's `images` or a user's `avatar`.
    fn public_url(&self, key: &str) -> String;
}

/// S3AssetStore
///
/// The concrete implementation over the AWS SDK. S3 compatibility means the same
/// client talks to a Dockerized MinIO locally and a cloud object store in production.
/// `force_path_style(true)` is required for MinIO-style gateways.
#[derive(Clone)]
pub struct S3AssetStore {
    client: s3::Client,
    endpoint: String,
    bucket_name: String,
}

impl S3AssetStore {
    /// Constructs the S3 client using credentials and configuration from AppConfig.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            // Path-style addressing (http://endpoint/bucket/key), required for MinIO.
            .force_path_style(true)
            .build();

        let client = s3::Client::from_conf(config);

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3AssetStore {
    /// Calls the S3 CreateBucket API. Idempotent, so it is safe to run at every
    /// startup.
    async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        // Uploads must complete within 10 minutes.
        let expires_in = Duration::from_secs(600);

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            // Forces the client request to include this Content-Type header.
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(expires_in).map_err(|e| e.to_string())?)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket_name, key)
    }
}

/// Strips directory-navigation segments (`..`, `.`, empty) from a user-influenced
/// key so an uploaded object can never escape its folder.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockAssetStore
///
/// In-memory implementation used in unit and integration tests: no network, and a
/// deterministic URL shape for assertions.
#[derive(Clone)]
pub struct MockAssetStore {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockAssetStore {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockAssetStore {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("mock storage error: simulation requested".to_string());
        }

        let sanitized_key = sanitize_key(key);

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitized_key
        ))
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://localhost:9000/mock-bucket/{}", sanitize_key(key))
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
