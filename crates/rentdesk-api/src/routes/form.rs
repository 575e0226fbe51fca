//! Property form extraction (multipart or JSON)

use axum::{
    extract::{FromRequest, Multipart, Request, multipart::Field},
    http::header::CONTENT_TYPE,
};
use bytes::BytesMut;
use rentdesk_core::FeaturesInput;
use rentdesk_storage::ImageUpload;
use serde_json::Value;

use crate::error::ApiError;

use super::json::ApiJson;
use super::types::PropertyJson;

/// Maximum number of images per request
pub const MAX_IMAGES: usize = 8;
/// Maximum size of a single image
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Text fields of a property form, untouched apart from decoding
#[derive(Debug, Default, Clone)]
pub struct PropertyFields {
    pub title: Option<String>,
    pub property_type: Option<String>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub maps_link: Option<String>,
    pub rent: Option<String>,
    pub deposit: Option<String>,
    pub features: Option<FeaturesInput>,
    pub owner_details: Option<String>,
}

/// A submitted property form with its uploaded images
#[derive(Debug, Default)]
pub struct PropertyForm {
    pub fields: PropertyFields,
    pub images: Vec<ImageUpload>,
}

impl<S> FromRequest<S> for PropertyForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            read_multipart(multipart).await
        } else {
            let ApiJson(body) = ApiJson::<PropertyJson>::from_request(req, state).await?;
            Ok(PropertyForm {
                fields: PropertyFields::from(body),
                images: Vec::new(),
            })
        }
    }
}

impl From<PropertyJson> for PropertyFields {
    fn from(body: PropertyJson) -> Self {
        Self {
            title: body.title,
            property_type: body.property_type,
            location: body.location,
            area: body.area,
            maps_link: body.maps_link,
            rent: body.rent.and_then(amount_text),
            deposit: body.deposit.and_then(amount_text),
            features: body.features,
            owner_details: body.owner_details,
        }
    }
}

/// Render a JSON amount as text for the shared parser; null means absent
fn amount_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<PropertyForm, ApiError> {
    let mut form = PropertyForm::default();
    let mut features: Vec<String> = Vec::new();
    let mut saw_features = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "images" {
            if form.images.len() >= MAX_IMAGES {
                return Err(ApiError::BadRequest(format!(
                    "Too many files: at most {} images are allowed",
                    MAX_IMAGES
                )));
            }
            form.images.push(read_image(field).await?);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        match name.as_str() {
            "title" => form.fields.title = Some(value),
            "type" => form.fields.property_type = Some(value),
            "location" => form.fields.location = Some(value),
            "area" => form.fields.area = Some(value),
            "mapsLink" => form.fields.maps_link = Some(value),
            "rent" => form.fields.rent = Some(value),
            "deposit" => form.fields.deposit = Some(value),
            "ownerDetails" => form.fields.owner_details = Some(value),
            "features" | "features[]" => {
                saw_features = true;
                features.push(value);
            }
            _ => {}
        }
    }

    if saw_features {
        form.fields.features = Some(if features.len() == 1 {
            FeaturesInput::Csv(features.remove(0))
        } else {
            FeaturesInput::List(features.into_iter().map(Some).collect())
        });
    }

    Ok(form)
}

async fn read_image(mut field: Field<'_>) -> Result<ImageUpload, ApiError> {
    let filename = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let mut data = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if data.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::BadRequest(format!(
                "File too large: each image must be at most {} MB",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(ImageUpload {
        filename,
        content_type,
        data: data.freeze(),
    })
}
