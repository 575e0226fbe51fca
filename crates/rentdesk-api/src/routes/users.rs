//! User management routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use rentdesk_auth::hash_password;
use rentdesk_core::{Action, can_delete_user};
use rentdesk_db::{NewUser, UpdateUser};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::{RequireAdmin, authorize};
use super::json::ApiJson;
use super::types::{CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse};
use super::validation::Validator;

/// GET /api/users (Admin only)
async fn list_users(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    authorize(&admin, Action::ListUsers, None, "Forbidden")?;

    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/users (Admin only)
async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    authorize(&admin, Action::CreateUser, None, "Forbidden")?;

    let mut v = Validator::new();
    let name = v.required("name", request.name.as_deref(), "Name is required");
    let email = v.email(request.email.as_deref());
    let password = v.password(request.password.as_deref());
    let role = v.managed_role(request.role.as_deref());
    v.finish()?;

    let (Some(name), Some(email), Some(password), Some(role)) = (name, email, password, role)
    else {
        return Err(ApiError::Internal("validated user fields missing".to_string()));
    };

    debug!("Creating {} user", role);

    let password_hash = hash_password(&password)?;
    let user = state
        .db
        .insert_user(NewUser {
            name,
            email,
            password_hash,
            role,
        })
        .await?;

    info!("Created user: {}", user.id);

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// PATCH /api/users/{id} (Admin only)
async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    authorize(&admin, Action::UpdateUser, None, "Forbidden")?;

    debug!("Updating user: {}", id);

    let mut v = Validator::new();
    let name = v.non_blank("name", request.name.as_deref(), "Name cannot be empty");
    let email = request.email.as_deref().and_then(|e| v.email(Some(e)));
    let password = request.password.as_deref().and_then(|p| v.password(Some(p)));
    let role = request.role.as_deref().and_then(|r| v.managed_role(Some(r)));
    v.finish()?;

    let existing = state
        .db
        .get_user_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // The sole admin keeps its role
    if existing.role.is_admin() && role.is_some() {
        return Err(ApiError::BadRequest(
            "Cannot change role of admin account".to_string(),
        ));
    }

    let password_hash = password.as_deref().map(hash_password).transpose()?;
    let user = state
        .db
        .update_user(
            &id,
            UpdateUser {
                name,
                email,
                role,
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!("Updated user: {}", user.id);

    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/{id} (Admin only)
async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(&admin, Action::DeleteUser, None, "Forbidden")?;

    debug!("Deleting user: {}", id);

    let user = state
        .db
        .get_user_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !can_delete_user(&user) {
        return Err(ApiError::BadRequest("Cannot delete admin account".to_string()));
    }

    if !state.db.delete_user(&id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!("Deleted user: {}", id);
    Ok(Json(MessageResponse::new("User removed")))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", patch(update_user).delete(delete_user))
}
