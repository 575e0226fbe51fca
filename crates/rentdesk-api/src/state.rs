//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use rentdesk_auth::JwtManager;
use rentdesk_db::Database;
use rentdesk_storage::ImageStorage;
use std::path::PathBuf;
use std::sync::Arc;

/// Handle used to render the Prometheus exposition
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub storage: Arc<dyn ImageStorage>,
    pub jwt: Arc<JwtManager>,
    /// Directory served under `/uploads`, when images are kept on local disk
    pub uploads_dir: Option<PathBuf>,
    /// Single origin allowed (with credentials) by CORS; any origin when unset
    pub frontend_url: Option<String>,
}

impl AppState {
    pub fn new(db: Database, storage: Arc<dyn ImageStorage>, jwt: Arc<JwtManager>) -> Self {
        Self {
            db,
            storage,
            jwt,
            uploads_dir: None,
            frontend_url: None,
        }
    }

    pub fn with_uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = Some(dir.into());
        self
    }

    pub fn with_frontend_url(mut self, origin: Option<String>) -> Self {
        self.frontend_url = origin.filter(|o| !o.trim().is_empty());
        self
    }
}
