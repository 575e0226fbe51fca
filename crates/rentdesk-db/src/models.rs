//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidUserRole(String),
    InvalidPropertyType(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidUserRole(s) => write!(f, "Invalid user role: {}", s),
            ParseError::InvalidPropertyType(s) => write!(f, "Invalid property type: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Residential,
    Commercial,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Residential => "residential",
            UserRole::Commercial => "commercial",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "residential" => Ok(UserRole::Residential),
            "commercial" => Ok(UserRole::Commercial),
            _ => Err(ParseError::InvalidUserRole(s.to_string())),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Residential,
    Commercial,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Residential => "residential",
            PropertyType::Commercial => "commercial",
        }
    }
}

impl FromStr for PropertyType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "residential" => Ok(PropertyType::Residential),
            "commercial" => Ok(PropertyType::Commercial),
            _ => Err(ParseError::InvalidPropertyType(s.to_string())),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Update user (for partial updates)
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub password_hash: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.password_hash.is_none()
    }
}

/// Owner details joined onto a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyOwner {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Property listing model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub property_type: PropertyType,
    pub location: String,
    pub area: String,
    pub maps_link: Option<String>,
    pub rent: f64,
    pub deposit: Option<f64>,
    pub features: Vec<String>,
    pub owner_details: Option<String>,
    pub images: Vec<String>,
    /// ID of the user that created the listing
    pub created_by: String,
    /// Creator's account, absent when the account has since been deleted
    pub owner: Option<PropertyOwner>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New property (for insertion)
#[derive(Debug, Clone)]
pub struct NewProperty {
    pub title: String,
    pub property_type: PropertyType,
    pub location: String,
    pub area: String,
    pub maps_link: Option<String>,
    pub rent: f64,
    pub deposit: Option<f64>,
    pub features: Vec<String>,
    pub owner_details: Option<String>,
    pub images: Vec<String>,
    pub created_by: String,
}

/// Allow-listed partial update of a property
///
/// Fields wrapped in `Option<Option<_>>` distinguish "leave unchanged"
/// (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub property_type: Option<PropertyType>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub maps_link: Option<Option<String>>,
    pub rent: Option<f64>,
    pub deposit: Option<Option<f64>>,
    pub features: Option<Vec<String>>,
    pub owner_details: Option<Option<String>>,
    pub images: Option<Vec<String>>,
}

impl PropertyPatch {
    pub fn is_empty(&self) -> bool {
        *self == PropertyPatch::default()
    }
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: UserRole::from_str(&role_str).map_err(|e| sqlx::Error::ColumnDecode {
                index: "role".to_string(),
                source: Box::new(e),
            })?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

/// Decode a JSON text column holding a list of strings
fn decode_string_list(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Vec<String>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Property {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let type_str: String = row.try_get("property_type")?;

        let owner_name: Option<String> = row.try_get("owner_name")?;
        let owner_email: Option<String> = row.try_get("owner_email")?;
        let owner_role: Option<String> = row.try_get("owner_role")?;
        let owner = match (owner_name, owner_email, owner_role) {
            (Some(name), Some(email), Some(role)) => Some(PropertyOwner {
                name,
                email,
                role: UserRole::from_str(&role).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "owner_role".to_string(),
                    source: Box::new(e),
                })?,
            }),
            _ => None,
        };

        Ok(Property {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            property_type: PropertyType::from_str(&type_str).map_err(|e| {
                sqlx::Error::ColumnDecode {
                    index: "property_type".to_string(),
                    source: Box::new(e),
                }
            })?,
            location: row.try_get("location")?,
            area: row.try_get("area")?,
            maps_link: row.try_get("maps_link")?,
            rent: row.try_get("rent")?,
            deposit: row.try_get("deposit")?,
            features: decode_string_list(row, "features")?,
            owner_details: row.try_get("owner_details")?,
            images: decode_string_list(row, "images")?,
            created_by: row.try_get("created_by")?,
            owner,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [UserRole::Admin, UserRole::Residential, UserRole::Commercial] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("read-only".parse::<UserRole>().is_err());
        assert!("Admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_property_type_rejects_unknown() {
        assert_eq!(
            "commercial".parse::<PropertyType>().unwrap(),
            PropertyType::Commercial
        );
        assert!("industrial".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            role: UserRole::Residential,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "residential");
    }

    #[test]
    fn test_empty_patch() {
        assert!(PropertyPatch::default().is_empty());
        let patch = PropertyPatch {
            deposit: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
