//! Core error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },
}

impl CoreError {
    /// Name of the offending input field
    pub fn field(&self) -> &'static str {
        match self {
            CoreError::NotANumber { field } | CoreError::Negative { field } => field,
        }
    }
}
