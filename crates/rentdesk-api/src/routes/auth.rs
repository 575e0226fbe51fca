//! Authentication extractors and routes

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    routing::post,
};
use rentdesk_auth::{AuthUser, extract_bearer_token, hash_password, verify_password};
use rentdesk_core::{Action, admin_registration_allowed, can_act};
use rentdesk_db::{NewUser, Property, UserRole};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::json::ApiJson;
use super::types::{AuthResponse, LoginRequest, RegisterAdminRequest, UserResponse};
use super::validation::{MAX_PASSWORD_LENGTH, Validator};

// ==================== Auth Extractors ====================

/// Extractor for authenticated user (required)
///
/// The token only identifies the account; the user is reloaded from the
/// store so deleted accounts and role changes take effect immediately.
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let token =
            extract_bearer_token(auth_header).map_err(|e| ApiError::Unauthorized(e.to_string()))?;
        let claims = app_state
            .jwt
            .validate_token(token)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        let user = app_state
            .db
            .get_user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;
        let user = AuthUser::from(user);

        debug!("Authenticated user: {} ({})", user.id, user.role);
        Ok(RequireAuth(user))
    }
}

/// Extractor for admin user (required)
pub struct RequireAdmin(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(ApiError::Forbidden("Forbidden".to_string()));
        }

        Ok(RequireAdmin(user))
    }
}

/// Reject unless `actor`'s role may attempt `action`
pub fn require_role(actor: &AuthUser, action: Action) -> Result<(), ApiError> {
    if action.permitted_roles().contains(&actor.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Forbidden".to_string()))
    }
}

/// Reject with `denial` unless `actor` may perform `action` on `target`
pub fn authorize(
    actor: &AuthUser,
    action: Action,
    target: Option<&Property>,
    denial: &str,
) -> Result<(), ApiError> {
    if can_act(actor, action, target) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(denial.to_string()))
    }
}

// ==================== Auth Routes ====================

/// POST /api/auth/register-admin
async fn register_admin(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterAdminRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut v = Validator::new();
    let name = v.required("name", request.name.as_deref(), "Name is required");
    let email = v.email(request.email.as_deref());
    let password = v.password(request.password.as_deref());
    v.finish()?;
    let (name, email, password) = (
        name.unwrap_or_default(),
        email.unwrap_or_default(),
        password.unwrap_or_default(),
    );

    let existing = state.db.count_users_with_role(UserRole::Admin).await?;
    if !admin_registration_allowed(existing) {
        return Err(ApiError::Conflict("Admin already exists".to_string()));
    }

    let password_hash = hash_password(&password)?;
    // A concurrent registration that got here first is caught by the store
    let admin = state
        .db
        .insert_user(NewUser {
            name,
            email,
            password_hash,
            role: UserRole::Admin,
        })
        .await?;

    info!("Registered admin account {}", admin.id);

    let token = state.jwt.generate_token(&admin.id, admin.role)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(admin),
            token,
            expires_in: state.jwt.expires_in(),
        }),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut v = Validator::new();
    let email = v.email(request.email.as_deref());
    let password = v.required("password", request.password.as_deref(), "Password is required");
    v.finish()?;
    let (email, password) = (email.unwrap_or_default(), password.unwrap_or_default());
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::InvalidCredentials);
    }

    debug!("Login attempt");

    // Find user - but don't return early to prevent timing attacks
    let user_result = state.db.get_user_by_email(&email).await?;

    // Always run one verification so unknown emails cost the same as wrong passwords.
    // This dummy hash is a valid Argon2 hash that will always fail verification.
    const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

    let user = match user_result {
        Some(user) => {
            let valid = verify_password(&password, &user.password_hash)?;
            valid.then_some(user)
        }
        None => {
            let _ = verify_password(&password, DUMMY_HASH);
            None
        }
    };

    let Some(user) = user else {
        metrics::counter!("rentdesk_logins_total", "outcome" => "failure").increment(1);
        return Err(ApiError::InvalidCredentials);
    };

    let token = state.jwt.generate_token(&user.id, user.role)?;
    metrics::counter!("rentdesk_logins_total", "outcome" => "success").increment(1);

    info!("User {} logged in", user.id);

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token,
        expires_in: state.jwt.expires_in(),
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register-admin", post(register_admin))
        .route("/api/auth/login", post(login))
}
