//! Property listing routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Local, NaiveTime, Utc};
use rentdesk_auth::AuthUser;
use rentdesk_core::{
    Action, CoreError, ListingParams, PropertyTypePolicy, build_query, can_change_type,
    image_reference, normalize_features, page_count, parse_amount,
};
use rentdesk_db::{NewProperty, PropertyPatch, PropertyType};
use rentdesk_storage::ImageUpload;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::{RequireAdmin, RequireAuth, authorize, require_role};
use super::form::{PropertyFields, PropertyForm};
use super::types::{
    MessageResponse, Pagination, PropertyListResponse, PropertyResponse, SummaryResponse,
};
use super::validation::Validator;

fn not_found() -> ApiError {
    ApiError::NotFound("Property not found".to_string())
}

fn amount_message(err: &CoreError, label: &str) -> String {
    match err {
        CoreError::NotANumber { .. } => format!("{} must be a number", label),
        CoreError::Negative { .. } => format!("{} must not be negative", label),
    }
}

/// Blank optional text becomes `None`
fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Type requested by an admin; anyone else's request is ignored
fn requested_type(
    v: &mut Validator,
    actor: &AuthUser,
    raw: Option<&str>,
) -> Option<PropertyType> {
    if !can_change_type(actor) {
        return None;
    }
    let raw = raw.map(str::trim).filter(|t| !t.is_empty())?;
    match raw.parse::<PropertyType>() {
        Ok(t) => Some(t),
        Err(_) => {
            v.reject("type", "Type must be residential or commercial");
            None
        }
    }
}

/// Store every upload and resolve the references clients will use
async fn store_images(state: &AppState, images: Vec<ImageUpload>) -> Result<Vec<String>, ApiError> {
    let mut references = Vec::with_capacity(images.len());
    for image in images {
        let stored = state.storage.store(image).await?;
        if let Some(reference) = image_reference(stored.path.as_deref(), stored.filename.as_deref()) {
            references.push(reference);
        }
    }
    debug!(
        "Stored {} image(s) with {} backend",
        references.len(),
        state.storage.backend_name()
    );
    Ok(references)
}

/// Start of the current server-local calendar day, in UTC
fn local_day_start() -> DateTime<Utc> {
    let today = Local::now().date_naive();
    today
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| today.and_time(NaiveTime::MIN).and_utc())
}

// ==================== Property Routes ====================

/// GET /api/properties (authenticated, scoped)
async fn list_properties(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<PropertyListResponse>, ApiError> {
    authorize(&actor, Action::ListProperties, None, "Forbidden")?;

    let (query, page) = build_query(&params, &actor);
    let (items, total) = state.db.list_properties(&query).await?;

    Ok(Json(PropertyListResponse {
        items: items.into_iter().map(PropertyResponse::from).collect(),
        pagination: Pagination {
            total,
            page: page.page,
            limit: page.limit,
            pages: page_count(total, page.limit),
        },
    }))
}

/// GET /api/properties/{id} and /api/properties/public/{id} (public)
async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let property = state.db.get_property(&id).await?.ok_or_else(not_found)?;
    Ok(Json(PropertyResponse::from(property)))
}

/// POST /api/properties
async fn create_property(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    form: PropertyForm,
) -> Result<(StatusCode, Json<PropertyResponse>), ApiError> {
    authorize(&actor, Action::CreateProperty, None, "Forbidden")?;

    let PropertyForm { fields, images } = form;
    let PropertyFields {
        title,
        property_type,
        location,
        area,
        maps_link,
        rent,
        deposit,
        features,
        owner_details,
    } = fields;

    let mut v = Validator::new();
    let title = v.required("title", title.as_deref(), "Title is required");
    let location = v.required("location", location.as_deref(), "Location is required");
    let area = v.required("area", area.as_deref(), "Area is required");
    let rent = match parse_amount("rent", rent.as_deref().unwrap_or_default()) {
        Ok(Some(rent)) => Some(rent),
        Ok(None) => {
            v.reject("rent", "Rent must be a number");
            None
        }
        Err(e) => {
            v.reject("rent", amount_message(&e, "Rent"));
            None
        }
    };
    let deposit = match parse_amount("deposit", deposit.as_deref().unwrap_or_default()) {
        Ok(deposit) => deposit,
        Err(e) => {
            v.reject("deposit", amount_message(&e, "Deposit"));
            None
        }
    };
    let requested = requested_type(&mut v, &actor, property_type.as_deref());
    v.finish()?;

    let images = store_images(&state, images).await?;
    if images.is_empty() {
        return Err(ApiError::field("images", "At least one image is required"));
    }

    debug!("Creating property for user {}", actor.id);

    let property = state
        .db
        .insert_property(NewProperty {
            title: title.unwrap_or_default(),
            property_type: PropertyTypePolicy::resolve(actor.role, requested),
            location: location.unwrap_or_default(),
            area: area.unwrap_or_default(),
            maps_link: optional_text(maps_link.as_deref()),
            rent: rent.unwrap_or_default(),
            deposit,
            features: features.as_ref().map(normalize_features).unwrap_or_default(),
            owner_details: optional_text(owner_details.as_deref()),
            images,
            created_by: actor.id.clone(),
        })
        .await?;

    metrics::counter!("rentdesk_properties_created_total").increment(1);
    info!("Created property {} for user {}", property.id, actor.id);

    Ok((StatusCode::CREATED, Json(PropertyResponse::from(property))))
}

/// PUT /api/properties/{id} (owner or admin)
async fn update_property(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: PropertyForm,
) -> Result<Json<PropertyResponse>, ApiError> {
    require_role(&actor, Action::UpdateProperty)?;

    let existing = state.db.get_property(&id).await?.ok_or_else(not_found)?;
    authorize(
        &actor,
        Action::UpdateProperty,
        Some(&existing),
        "You can only edit your own properties",
    )?;

    let PropertyForm { fields, images } = form;

    let mut v = Validator::new();
    let mut patch = PropertyPatch {
        title: v.non_blank("title", fields.title.as_deref(), "Title cannot be empty"),
        location: v.non_blank("location", fields.location.as_deref(), "Location cannot be empty"),
        area: v.non_blank("area", fields.area.as_deref(), "Area cannot be empty"),
        maps_link: fields.maps_link.as_deref().map(|m| optional_text(Some(m))),
        owner_details: fields
            .owner_details
            .as_deref()
            .map(|o| optional_text(Some(o))),
        features: fields.features.as_ref().map(normalize_features),
        property_type: requested_type(&mut v, &actor, fields.property_type.as_deref()),
        ..Default::default()
    };

    if let Some(raw) = fields.rent.as_deref() {
        match parse_amount("rent", raw) {
            Ok(Some(rent)) => patch.rent = Some(rent),
            Ok(None) => v.reject("rent", "Rent must be a number"),
            Err(e) => v.reject("rent", amount_message(&e, "Rent")),
        }
    }
    if let Some(raw) = fields.deposit.as_deref() {
        match parse_amount("deposit", raw) {
            Ok(deposit) => patch.deposit = Some(deposit),
            Err(e) => v.reject("deposit", amount_message(&e, "Deposit")),
        }
    }
    v.finish()?;

    if !images.is_empty() {
        let images = store_images(&state, images).await?;
        if images.is_empty() {
            return Err(ApiError::field("images", "At least one image is required"));
        }
        patch.images = Some(images);
    }

    debug!("Updating property {}", id);

    let property = state
        .db
        .update_property(&id, patch)
        .await?
        .ok_or_else(not_found)?;

    info!("Updated property {}", property.id);

    Ok(Json(PropertyResponse::from(property)))
}

/// DELETE /api/properties/{id} (owner or admin)
async fn delete_property(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_role(&actor, Action::DeleteProperty)?;

    let existing = state.db.get_property(&id).await?.ok_or_else(not_found)?;
    authorize(
        &actor,
        Action::DeleteProperty,
        Some(&existing),
        "You can only delete your own properties",
    )?;

    if !state.db.delete_property(&id).await? {
        return Err(not_found());
    }

    info!("Deleted property {}", id);
    Ok(Json(MessageResponse::new("Property deleted")))
}

/// GET /api/properties/summary (Admin only)
async fn property_summary(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, ApiError> {
    authorize(&admin, Action::ViewSummary, None, "Forbidden")?;

    let counts = state.db.property_counts(local_day_start()).await?;
    Ok(Json(SummaryResponse::from(counts)))
}

/// Create property routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/properties", get(list_properties).post(create_property))
        .route("/api/properties/summary", get(property_summary))
        .route("/api/properties/public/{id}", get(get_property))
        .route(
            "/api/properties/{id}",
            get(get_property)
                .put(update_property)
                .delete(delete_property),
        )
}
