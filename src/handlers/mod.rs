pub mod demo;
pub mod portfolio;
pub mod properties;

use axum::{http::StatusCode, Json};

use crate::models::common::{ErrorResponse, MessageResponse};
use crate::services::property_service::PropertyError;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: String) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error,
            code: Some(code.to_string()),
        }),
    )
}

pub fn validation_error(error: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", error.into())
}

impl From<PropertyError> for ApiError {
    fn from(err: PropertyError) -> Self {
        match err {
            PropertyError::Validation(msg) => validation_error(msg),
            PropertyError::NotFound(id) => {
                tracing::debug!(property_id = %id, "Property not found");
                api_error(
                    StatusCode::NOT_FOUND,
                    "PROPERTY_NOT_FOUND",
                    "Property not found".to_string(),
                )
            }
            PropertyError::Ingestion(e) => {
                tracing::error!("Ingestion failed: {}", e);
                api_error(
                    StatusCode::BAD_GATEWAY,
                    "INGESTION_FAILED",
                    format!("Failed to fetch property data: {}", e),
                )
            }
            PropertyError::Store(e) => {
                tracing::error!("Store error: {}", e);
                api_error(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_ERROR",
                    "Storage temporarily unavailable".to_string(),
                )
            }
        }
    }
}

/// Handler for GET /api/
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Property Value Tracker API".to_string(),
    })
}
