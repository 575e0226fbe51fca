//! API routes

mod auth;
mod form;
mod health;
mod json;
pub mod metrics;
mod properties;
mod types;
mod users;
mod validation;


use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::warn;

use crate::error::ApiError;
use crate::state::{AppState, MetricsHandle};

pub use auth::{RequireAdmin, RequireAuth};
pub use form::{MAX_IMAGE_BYTES, MAX_IMAGES};

/// Room for the form fields and multipart framing around the images
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// JSON 404 for unknown routes
async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Build the CORS policy
///
/// A configured frontend origin is allowed with credentials; otherwise any
/// origin is allowed, without credentials.
fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    match frontend_url.map(|url| (url, HeaderValue::from_str(url.trim_end_matches('/')))) {
        Some((_, Ok(origin))) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true),
        Some((url, Err(_))) => {
            warn!("Ignoring invalid frontend origin {:?}, allowing any origin", url);
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(methods)
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    }
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let cors = cors_layer(state.frontend_url.as_deref());
    let uploads_dir = state.uploads_dir.clone();

    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(properties::routes())
        .fallback(route_not_found)
        .with_state(state);

    // Locally stored images are served as static files
    if let Some(dir) = uploads_dir {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
        .layer(DefaultBodyLimit::max(
            MAX_IMAGES * MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES,
        ))
        .layer(cors)
}
