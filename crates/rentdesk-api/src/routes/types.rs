//! Request/Response DTOs

use rentdesk_core::FeaturesInput;
use rentdesk_db::{Property, PropertyCounts, PropertyType, User, UserRole};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Admin self-registration request
#[derive(Debug, Default, Deserialize)]
pub struct RegisterAdminRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login / registration response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    pub expires_in: i64,
}

// ==================== User Types ====================

/// Create user request
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Update user request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// User response (without password)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Plain `{ "message": ... }` acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ==================== Property Types ====================

/// JSON body accepted by property create/update
///
/// Amounts are kept as raw JSON so that numbers and numeric strings are
/// both accepted. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyJson {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub maps_link: Option<String>,
    pub rent: Option<serde_json::Value>,
    pub deposit: Option<serde_json::Value>,
    pub features: Option<FeaturesInput>,
    pub owner_details: Option<String>,
}

/// Creator of a listing as shown to clients
///
/// Only `id` is present once the account has been deleted.
#[derive(Debug, Serialize)]
pub struct OwnerSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// Property response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub location: String,
    pub area: String,
    pub maps_link: Option<String>,
    pub rent: f64,
    pub deposit: Option<f64>,
    pub features: Vec<String>,
    pub owner_details: Option<String>,
    pub images: Vec<String>,
    pub created_by: OwnerSummary,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Property> for PropertyResponse {
    fn from(p: Property) -> Self {
        let created_by = match p.owner {
            Some(owner) => OwnerSummary {
                id: p.created_by,
                name: Some(owner.name),
                email: Some(owner.email),
                role: Some(owner.role),
            },
            None => OwnerSummary {
                id: p.created_by,
                name: None,
                email: None,
                role: None,
            },
        };

        Self {
            id: p.id,
            title: p.title,
            property_type: p.property_type,
            location: p.location,
            area: p.area,
            maps_link: p.maps_link,
            rent: p.rent,
            deposit: p.deposit,
            features: p.features,
            owner_details: p.owner_details,
            images: p.images,
            created_by,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

/// Paginated property listing
#[derive(Debug, Serialize)]
pub struct PropertyListResponse {
    pub items: Vec<PropertyResponse>,
    pub pagination: Pagination,
}

/// Aggregate listing counts
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total: i64,
    pub today: i64,
    pub residential: i64,
    pub commercial: i64,
}

impl From<PropertyCounts> for SummaryResponse {
    fn from(counts: PropertyCounts) -> Self {
        Self {
            total: counts.total,
            today: counts.today,
            residential: counts.residential,
            commercial: counts.commercial,
        }
    }
}
