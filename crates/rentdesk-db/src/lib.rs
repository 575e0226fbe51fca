//! RentDesk Database Layer
//!
//! This crate provides the persistence layer for RentDesk,
//! storing users and property listings in SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{Database, PropertyCounts, PropertyQuery};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
