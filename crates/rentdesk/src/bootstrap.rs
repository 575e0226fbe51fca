//! Startup tasks that prepare the store and the image backend

use anyhow::Result;
use rentdesk_db::{Database, NewUser, UserRole};
use rentdesk_storage::{ImageStorage, LocalStorage, S3Config, S3Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{BootstrapAdminConfig, StorageConfig};

/// What `seed_admin` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    MissingCredentials,
    AdminExists,
}

/// Create the admin account from configured credentials when none exists yet
pub async fn seed_admin(db: &Database, admin: &BootstrapAdminConfig) -> Result<SeedOutcome> {
    let Some((name, email, password)) = admin.credentials() else {
        info!("Admin credentials not provided, skipping admin seed");
        return Ok(SeedOutcome::MissingCredentials);
    };

    if db.has_admin().await? {
        info!("Admin account already exists, skipping admin seed");
        return Ok(SeedOutcome::AdminExists);
    }

    let password_hash = rentdesk_auth::hash_password(password)?;
    let user = db
        .insert_user(NewUser {
            name: name.trim().to_string(),
            email: email.to_string(),
            password_hash,
            role: UserRole::Admin,
        })
        .await?;

    info!("Seeded admin account {}", user.email);
    Ok(SeedOutcome::Created)
}

/// Pick the image backend
///
/// Returns the backend and, for local storage, the directory to serve under
/// `/uploads`. A broken S3 setup falls back to local disk.
pub async fn build_storage(config: &StorageConfig) -> Result<(Arc<dyn ImageStorage>, Option<PathBuf>)> {
    if config.backend.eq_ignore_ascii_case("s3") {
        let s3 = &config.s3;
        let s3_config = S3Config {
            bucket: s3.bucket.clone().unwrap_or_default(),
            region: s3.region.clone().unwrap_or_else(|| "us-east-1".to_string()),
            endpoint: s3.endpoint.clone(),
            access_key_id: s3.access_key.clone(),
            secret_access_key: s3.secret_key.clone(),
            prefix: s3.prefix.clone(),
            allow_http: s3.allow_http,
            public_url: s3.public_url.clone(),
        };

        match S3Storage::new(s3_config) {
            Ok(storage) => return Ok((Arc::new(storage), None)),
            Err(e) => warn!("S3 storage unavailable ({}), falling back to local storage", e),
        }
    } else if !config.backend.eq_ignore_ascii_case("local") {
        warn!(
            "Unknown storage backend {:?}, using local storage",
            config.backend
        );
    }

    let local = LocalStorage::new(&config.local.path).await?;
    let dir = local.base_path().to_path_buf();
    Ok((Arc::new(local), Some(dir)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LocalStorageConfig, S3StorageConfig};
    use tempfile::TempDir;

    fn admin(name: &str, email: &str, password: &str) -> BootstrapAdminConfig {
        BootstrapAdminConfig {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_seed_admin_once() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let config = admin("Root", "Root@Example.com", "secret1");

        assert_eq!(seed_admin(&db, &config).await.unwrap(), SeedOutcome::Created);
        assert!(db.has_admin().await.unwrap());

        let user = db
            .get_user_by_email("root@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, UserRole::Admin);
        assert!(rentdesk_auth::verify_password("secret1", &user.password_hash).unwrap());

        let other = admin("Other", "other@example.com", "secret2");
        assert_eq!(
            seed_admin(&db, &other).await.unwrap(),
            SeedOutcome::AdminExists
        );
        assert_eq!(db.count_users_with_role(UserRole::Admin).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_admin_skips_without_credentials() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let config = BootstrapAdminConfig {
            email: Some("root@example.com".to_string()),
            ..Default::default()
        };

        assert_eq!(
            seed_admin(&db, &config).await.unwrap(),
            SeedOutcome::MissingCredentials
        );
        assert!(!db.has_admin().await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_is_served() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uploads");
        let config = StorageConfig {
            backend: "local".to_string(),
            local: LocalStorageConfig {
                path: path.to_string_lossy().into_owned(),
            },
            s3: S3StorageConfig::default(),
        };

        let (storage, served) = build_storage(&config).await.unwrap();
        assert_eq!(storage.backend_name(), "local");
        assert_eq!(served, Some(path.clone()));
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_s3_without_bucket_falls_back_to_local() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fallback");
        let config = StorageConfig {
            backend: "s3".to_string(),
            local: LocalStorageConfig {
                path: path.to_string_lossy().into_owned(),
            },
            s3: S3StorageConfig::default(),
        };

        let (storage, served) = build_storage(&config).await.unwrap();
        assert_eq!(storage.backend_name(), "local");
        assert_eq!(served, Some(path));
    }
}
