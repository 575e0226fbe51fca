//! S3-compatible storage backend
//!
//! Uses the `object_store` crate to store listing images in AWS S3,
//! MinIO, or other S3-compatible services.

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{ImageStorage, ImageUpload, StoredImage, unique_filename};
use crate::error::StorageError;

/// S3 storage configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// S3 region (e.g., "us-east-1")
    pub region: String,
    /// S3 endpoint URL (for MinIO or other S3-compatible services)
    pub endpoint: Option<String>,
    /// AWS access key ID
    pub access_key_id: Option<String>,
    /// AWS secret access key
    pub secret_access_key: Option<String>,
    /// Prefix for all objects (optional)
    pub prefix: Option<String>,
    /// Allow HTTP (not HTTPS) connections
    pub allow_http: bool,
    /// Base URL objects are publicly reachable under
    pub public_url: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            prefix: None,
            allow_http: false,
            public_url: None,
        }
    }
}

impl S3Config {
    /// Public base URL for objects in this bucket
    ///
    /// An explicit `public_url` wins; then path-style under a custom
    /// endpoint; then the virtual-hosted AWS form.
    pub fn public_base_url(&self) -> String {
        if let Some(url) = &self.public_url {
            return url.trim_end_matches('/').to_string();
        }
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

/// S3 storage backend
///
/// Stores images under `<prefix>/<uuid>.<ext>` and hands back absolute URLs.
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    public_base_url: String,
}

impl S3Storage {
    /// Create a new S3 storage backend
    pub fn new(config: S3Config) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::Configuration(
                "S3 bucket name is not set".to_string(),
            ));
        }

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region);

        // Set endpoint for MinIO or other S3-compatible services
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        // Set credentials
        if let Some(access_key) = &config.access_key_id {
            builder = builder.with_access_key_id(access_key);
        }
        if let Some(secret_key) = &config.secret_access_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        // Allow HTTP for local development (MinIO)
        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder.build().map_err(|e| {
            StorageError::Configuration(format!("Failed to create S3 client: {}", e))
        })?;

        info!(
            "Initialized S3 storage: bucket={}, region={}, endpoint={:?}, prefix={:?}",
            config.bucket, config.region, config.endpoint, config.prefix
        );

        Ok(Self::with_store(Arc::new(store), &config))
    }

    /// Build on top of an existing object store
    pub fn with_store(store: Arc<dyn ObjectStore>, config: &S3Config) -> Self {
        Self {
            store,
            prefix: config
                .prefix
                .as_deref()
                .unwrap_or_default()
                .trim_matches('/')
                .to_string(),
            public_base_url: config.public_base_url(),
        }
    }

    fn object_key(&self, filename: &str) -> String {
        if self.prefix.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", self.prefix, filename)
        }
    }
}

#[async_trait]
impl ImageStorage for S3Storage {
    async fn store(&self, upload: ImageUpload) -> Result<StoredImage, StorageError> {
        let filename = unique_filename(upload.filename.as_deref(), upload.content_type.as_deref());
        let key = self.object_key(&filename);
        let path = ObjectPath::from(key.as_str());
        debug!("Writing image to S3: {}", path);

        let content_type = upload.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .to_string()
        });
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, AttributeValue::from(content_type));

        self.store
            .put_opts(
                &path,
                PutPayload::from(upload.data),
                PutOptions {
                    attributes,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(StoredImage {
            path: Some(format!("{}/{}", self.public_base_url, key)),
            filename: Some(filename),
        })
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use object_store::memory::InMemory;

    fn config() -> S3Config {
        S3Config {
            bucket: "listings".to_string(),
            prefix: Some("/images/".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_public_base_url() {
        let mut config = config();
        assert_eq!(
            config.public_base_url(),
            "https://listings.s3.us-east-1.amazonaws.com"
        );

        config.endpoint = Some("http://localhost:9000/".to_string());
        assert_eq!(config.public_base_url(), "http://localhost:9000/listings");

        config.public_url = Some("https://cdn.example.com/".to_string());
        assert_eq!(config.public_base_url(), "https://cdn.example.com");
    }

    #[test]
    fn test_missing_bucket_rejected() {
        let result = S3Storage::new(S3Config::default());
        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_store_returns_absolute_url() {
        let store = Arc::new(InMemory::new());
        let storage = S3Storage::with_store(store.clone(), &config());

        let stored = storage
            .store(ImageUpload {
                filename: Some("kitchen.jpg".to_string()),
                content_type: Some("image/jpeg".to_string()),
                data: Bytes::from_static(b"jpeg-bytes"),
            })
            .await
            .unwrap();

        let filename = stored.filename.unwrap();
        let url = stored.path.unwrap();
        assert_eq!(
            url,
            format!("https://listings.s3.us-east-1.amazonaws.com/images/{filename}")
        );

        let object = store
            .get(&ObjectPath::from(format!("images/{filename}")))
            .await
            .unwrap();
        assert_eq!(
            object.attributes.get(&Attribute::ContentType).map(|v| v.as_ref()),
            Some("image/jpeg")
        );
        assert_eq!(object.bytes().await.unwrap(), Bytes::from_static(b"jpeg-bytes"));
    }
}
