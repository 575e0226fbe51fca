//! Local disk storage backend

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::backend::{ImageStorage, ImageUpload, StoredImage, unique_filename};
use crate::error::StorageError;

/// Local disk storage backend
///
/// Stores every image flat in one directory: `<base_path>/<uuid>.<ext>`.
/// The directory is what the HTTP layer serves under `/uploads`.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).await?;

        info!("Initialized local storage at {:?}", base_path);

        Ok(Self { base_path })
    }

    /// Directory images are written to
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl ImageStorage for LocalStorage {
    async fn store(&self, upload: ImageUpload) -> Result<StoredImage, StorageError> {
        let filename = unique_filename(upload.filename.as_deref(), upload.content_type.as_deref());
        let path = self.base_path.join(&filename);
        debug!("Writing image to {:?}", path);

        // Write atomically using a temp file
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &upload.data).await?;
        fs::rename(&temp_path, &path).await?;

        // The base directory itself is what gets served under `/uploads`
        Ok(StoredImage {
            path: Some(format!("uploads/{}", filename)),
            filename: Some(filename),
        })
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::TempDir;

    fn upload(name: &str, data: &'static [u8]) -> ImageUpload {
        ImageUpload {
            filename: Some(name.to_string()),
            content_type: Some("image/png".to_string()),
            data: Bytes::from_static(data),
        }
    }

    #[tokio::test]
    async fn test_store_writes_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("uploads")).await.unwrap();

        let stored = storage.store(upload("photo.png", b"png-bytes")).await.unwrap();

        let filename = stored.filename.unwrap();
        assert!(filename.ends_with(".png"));
        assert_eq!(stored.path.unwrap(), format!("uploads/{}", filename));
        let path = storage.base_path().join(&filename);
        assert_eq!(fs::read(&path).await.unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_same_name_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let first = storage.store(upload("a.png", b"one")).await.unwrap();
        let second = storage.store(upload("a.png", b"two")).await.unwrap();

        let first = storage.base_path().join(first.filename.unwrap());
        let second = storage.base_path().join(second.filename.unwrap());
        assert_ne!(first, second);
        assert_eq!(fs::read(&first).await.unwrap(), b"one");
        assert_eq!(fs::read(&second).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_reference_ignores_nested_base_path() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("uploads").join("listings"))
            .await
            .unwrap();

        let stored = storage.store(upload("room.jpg", b"jpg")).await.unwrap();
        let filename = stored.filename.unwrap();
        assert_eq!(stored.path.unwrap(), format!("uploads/{}", filename));
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = LocalStorage::new(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(storage.backend_name(), "local");
    }
}
