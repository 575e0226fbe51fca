//! Input validation helpers

use rentdesk_db::UserRole;

use crate::error::{ApiError, FieldError};

/// Minimum allowed password length
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Maximum allowed password length (prevent DoS with very large passwords)
pub const MAX_PASSWORD_LENGTH: usize = 256;
/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;

/// Collects field errors so a request reports every problem at once
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Require a non-blank value, returning it trimmed
    pub fn required(&mut self, field: &str, value: Option<&str>, message: &str) -> Option<String> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Some(v.to_string()),
            None => {
                self.reject(field, message);
                None
            }
        }
    }

    /// If present, the value must be non-blank
    pub fn non_blank(&mut self, field: &str, value: Option<&str>, message: &str) -> Option<String> {
        let value = value?;
        self.required(field, Some(value), message)
    }

    pub fn email(&mut self, value: Option<&str>) -> Option<String> {
        match value.map(str::trim).filter(|v| is_valid_email(v)) {
            Some(v) => Some(v.to_string()),
            None => {
                self.reject("email", "Valid email is required");
                None
            }
        }
    }

    pub fn password(&mut self, value: Option<&str>) -> Option<String> {
        match value {
            Some(v) if v.len() < MIN_PASSWORD_LENGTH => {
                self.reject(
                    "password",
                    format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
                );
                None
            }
            Some(v) if v.len() > MAX_PASSWORD_LENGTH => {
                self.reject(
                    "password",
                    format!(
                        "Password exceeds maximum length of {} characters",
                        MAX_PASSWORD_LENGTH
                    ),
                );
                None
            }
            Some(v) => Some(v.to_string()),
            None => {
                self.reject(
                    "password",
                    format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
                );
                None
            }
        }
    }

    /// Role assignable through user management (never admin)
    pub fn managed_role(&mut self, value: Option<&str>) -> Option<UserRole> {
        match value.and_then(|v| v.trim().parse::<UserRole>().ok()) {
            Some(role) if !role.is_admin() => Some(role),
            _ => {
                self.reject("role", "Role must be residential or commercial");
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// Loose structural email check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
