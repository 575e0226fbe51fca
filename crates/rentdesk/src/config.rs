//! Configuration loading

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// JWT secret used when none is configured
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub bootstrap_admin: BootstrapAdminConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Origin of the web frontend; enables credentialed CORS for it alone
    pub frontend_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            frontend_url: None,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/rentdesk.db?mode=rwc".to_string(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_expiry_hours: 24,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `local` or `s3`
    pub backend: String,
    pub local: LocalStorageConfig,
    pub s3: S3StorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            local: LocalStorageConfig::default(),
            s3: S3StorageConfig::default(),
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalStorageConfig {
    pub path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            path: "./uploads".to_string(),
        }
    }
}

/// S3 storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct S3StorageConfig {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub prefix: Option<String>,
    pub allow_http: bool,
    /// Public base URL for stored objects (e.g. a CDN)
    pub public_url: Option<String>,
}

/// Admin account created at startup when none exists
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BootstrapAdminConfig {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl BootstrapAdminConfig {
    /// Name, email and password, only when all three are set
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            present(&self.name)?,
            present(&self.email)?,
            present(&self.password)?,
        ))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration: defaults, then the TOML file if present, then
    /// `RENTDESK_*` environment variables (`RENTDESK_SERVER__PORT=8080`)
    ///
    /// Runs before logging is set up, so it stays silent; see `describe_source`.
    pub fn load(path: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("RENTDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse configuration from {}", path))?;

        Ok(config)
    }

    /// Where the configuration came from, for the startup log
    pub fn describe_source(path: &str) -> String {
        if Path::new(path).is_file() {
            format!("Loaded configuration from {}", path)
        } else {
            format!("Config file not found at {}, using defaults", path)
        }
    }

    /// Log warnings for settings that are unsafe in production
    pub fn warn_insecure(&self) {
        if self.auth.jwt_secret == DEFAULT_JWT_SECRET || self.auth.jwt_secret.trim().is_empty() {
            warn!("JWT secret is not configured; set JWT_SECRET before deploying");
        }
    }
}
