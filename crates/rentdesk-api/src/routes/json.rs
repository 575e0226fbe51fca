//! JSON body extractor with API-shaped rejections

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, FieldError};

/// `Json<T>` whose rejections answer 400 in the API error format
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection_error(rejection)),
        }
    }
}

fn rejection_error(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(e) => ApiError::Validation(vec![data_error(&e.body_text())]),
        JsonRejection::JsonSyntaxError(_) => ApiError::field("body", "Malformed JSON body"),
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::BadRequest("Expected a JSON request body".to_string())
        }
        other => ApiError::BadRequest(other.body_text()),
    }
}

/// Split "...target type: <path>: <reason>" into the offending field and reason
fn data_error(text: &str) -> FieldError {
    let detail = text
        .split_once("target type: ")
        .map(|(_, detail)| detail)
        .unwrap_or(text);

    match detail.split_once(": ") {
        Some((path, reason)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            FieldError::new(path, reason)
        }
        _ => FieldError::new("body", detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_names_the_field() {
        let err = data_error(
            "Failed to deserialize the JSON body into the target type: email: invalid type: integer `5`, expected a string at line 1 column 11",
        );
        assert_eq!(err.field, "email");
        assert!(err.message.starts_with("invalid type: integer `5`"));
    }

    #[test]
    fn test_data_error_without_path() {
        let err = data_error(
            "Failed to deserialize the JSON body into the target type: invalid type: sequence, expected struct LoginRequest",
        );
        assert_eq!(err.field, "body");
        assert!(err.message.starts_with("invalid type"));
    }
}
