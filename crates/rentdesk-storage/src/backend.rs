//! Image storage trait

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use uuid::Uuid;

use crate::error::StorageError;

/// An uploaded file, fully buffered
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Filename supplied by the client, if any
    pub filename: Option<String>,
    /// Content type supplied by the client, if any
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Where a stored image ended up
///
/// Backends fill in whichever of the two they know. Turning this into a
/// public reference is up to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredImage {
    /// Path relative to the served uploads root, or an absolute URL
    pub path: Option<String>,
    /// Stored object name
    pub filename: Option<String>,
}

/// Storage backend trait for listing images
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Persist one image under a fresh unique name
    async fn store(&self, upload: ImageUpload) -> Result<StoredImage, StorageError>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Generate a collision-free object name, keeping a sensible extension
///
/// The extension comes from the client filename when it has a plain
/// alphanumeric one, otherwise from the content type.
pub fn unique_filename(original: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    let ext = from_name.or_else(|| {
        content_type
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    });

    let id = Uuid::new_v4();
    match ext {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}
