use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;

// Presigned uploads stay valid for five minutes; long enough for a catalog
// image, short enough that a leaked URL is useless.
const UPLOAD_EXPIRY: Duration = Duration::from_secs(300);

/// MediaStore
///
/// Contract for the product-imagery storage layer. The admin console never
/// proxies image bytes; it hands the browser a short-lived presigned URL and
/// stores only the resulting object key on the product record. The trait
/// exists so handlers can be tested against an in-memory mock instead of a
/// live bucket.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Provisions the configured bucket if it does not exist. Called at
    /// startup in local environments (MinIO); a no-op against managed
    /// storage.
    async fn ensure_bucket(&self);

    /// Generates a temporary signed URL for a direct PUT of one object,
    /// constrained to the given content type.
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, String>;
}

/// MediaState
///
/// The concrete type used to share the media store across the application
/// state.
pub type MediaState = Arc<dyn MediaStore>;

/// sanitize_key
///
/// Strips directory-navigation segments from an object key so a crafted
/// filename cannot escape the upload prefix.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// S3MediaStore
///
/// The concrete implementation using the AWS SDK for S3, compatible with
/// MinIO locally and the managed storage gateway in production.
#[derive(Clone)]
pub struct S3MediaStore {
    client: s3::Client,
    bucket: String,
}

impl S3MediaStore {
    /// Constructs the S3 client from the loaded application configuration.
    pub async fn new(config: &AppConfig) -> Self {
        let credentials =
            s3::config::Credentials::new(&config.s3_key, &config.s3_secret, None, None, "static");

        let s3_config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .region(s3::config::Region::new(config.s3_region.clone()))
            .behavior_version_latest()
            // Path-style addressing is required by MinIO and by the managed
            // storage gateway.
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(s3_config),
            bucket: config.s3_bucket.clone(),
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn ensure_bucket(&self) {
        // CreateBucket is idempotent; safe to call on every startup.
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await;
    }

    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, String> {
        let key = sanitize_key(key);

        let presigning = PresigningConfig::expires_in(UPLOAD_EXPIRY).map_err(|e| e.to_string())?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            // The signature covers the content type, so the browser upload
            // must match what the admin console declared.
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned.uri().to_string())
    }
}

/// MockMediaStore
///
/// Test implementation returning deterministic URLs, with a failure switch
/// for exercising the handler's error path.
#[derive(Clone, Default)]
pub struct MockMediaStore {
    pub should_fail: bool,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn ensure_bucket(&self) {}

    async fn presign_upload(&self, key: &str, _content_type: &str) -> Result<String, String> {
        if self.should_fail {
            return Err("mock media store failure".to_string());
        }
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}
