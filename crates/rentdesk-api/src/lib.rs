//! RentDesk REST API
//!
//! This crate provides the Axum-based HTTP API for RentDesk:
//! authentication, user management and property listings.

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, FieldError};
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
