//! RentDesk Authentication
//!
//! This crate provides password hashing, JWT issuing and verification,
//! and the authenticated-user identity shared by the API handlers.

pub mod error;
pub mod identity;
pub mod jwt;
pub mod password;

pub use error::AuthError;
pub use identity::{AuthUser, extract_bearer_token};
pub use jwt::{Claims, JwtManager};
pub use password::{hash_password, verify_password};
