//! RentDesk - property rental listing backend

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod bootstrap;
mod config;

use config::{Config, LoggingConfig};
use rentdesk_api::{AppState, create_router};
use rentdesk_auth::JwtManager;
use rentdesk_db::Database;

/// RentDesk - property rental listing backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "RENTDESK_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Database URL (e.g. sqlite:data/rentdesk.db?mode=rwc)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Secret used to sign access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Frontend origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL")]
    frontend_url: Option<String>,

    /// Name of the admin account to seed
    #[arg(long, env = "ADMIN_NAME")]
    admin_name: Option<String>,

    /// Email of the admin account to seed
    #[arg(long, env = "ADMIN_EMAIL")]
    admin_email: Option<String>,

    /// Password of the admin account to seed
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,
}

impl Args {
    /// Command line and well-known environment variables win over the file
    fn apply(self, config: &mut Config) {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if let Some(secret) = self.jwt_secret {
            config.auth.jwt_secret = secret;
        }
        if self.frontend_url.is_some() {
            config.server.frontend_url = self.frontend_url;
        }
        if self.admin_name.is_some() {
            config.bootstrap_admin.name = self.admin_name;
        }
        if self.admin_email.is_some() {
            config.bootstrap_admin.email = self.admin_email;
        }
        if self.admin_password.is_some() {
            config.bootstrap_admin.password = self.admin_password;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.clone();
    let mut config = Config::load(&config_path)?;
    args.apply(&mut config);

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting RentDesk v{}", env!("CARGO_PKG_VERSION"));
    info!("{}", Config::describe_source(&config_path));
    config.warn_insecure();

    // Initialize database
    if let Some(dir) = sqlite_parent_dir(&config.database.url) {
        tokio::fs::create_dir_all(dir).await?;
    }
    let db = Database::new(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    bootstrap::seed_admin(&db, &config.bootstrap_admin).await?;

    // Initialize storage backend
    let (storage, uploads_dir) = bootstrap::build_storage(&config.storage).await?;
    info!("Image storage backend: {}", storage.backend_name());

    // Initialize JWT manager
    let jwt = Arc::new(JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.token_expiry_hours,
    ));

    // Initialize metrics
    let metrics_handle = if config.metrics.enabled {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(Arc::new(handle)),
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    // Create application state
    let mut state = AppState::new(db, storage, jwt)
        .with_frontend_url(config.server.frontend_url.clone());
    if let Some(dir) = uploads_dir {
        state = state.with_uploads_dir(dir);
    }

    // Create router
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    // Determine bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Directory holding a file-backed SQLite database, if any
fn sqlite_parent_dir(url: &str) -> Option<&std::path::Path> {
    let path = url.strip_prefix("sqlite:")?;
    let path = path.trim_start_matches("//");
    let path = path.split('?').next()?;
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
