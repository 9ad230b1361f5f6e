use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::{validation_error, ApiError};
use crate::{
    models::{
        common::MessageResponse,
        history::{HistoryEntryResponse, HistoryQuery},
        property::{
            CreatePropertyRequest, Property, PropertyListQuery, PropertyResponse,
            UpdatePropertyRequest,
        },
    },
    services::metrics::derive_property_metrics,
    AppState,
};

fn to_response(property: &Property) -> PropertyResponse {
    PropertyResponse::new(property, &derive_property_metrics(property))
}

/// Handler for GET /api/properties
/// Lists tracked properties, newest first, with derived figures
pub async fn list_properties(
    State(state): State<AppState>,
    query: Result<Query<PropertyListQuery>, QueryRejection>,
) -> Result<Json<Vec<PropertyResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| validation_error(e.body_text()))?;
    let filter = query.validate().map_err(validation_error)?;

    let properties = state.properties.list(&filter).await?;
    tracing::debug!("Listing {} properties", properties.len());

    Ok(Json(properties.iter().map(to_response).collect()))
}

/// Handler for GET /api/properties/{id}
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let property = state.properties.get(&id).await?;
    Ok(Json(to_response(&property)))
}

/// Handler for POST /api/properties
/// Accepts either a listing URL (ingested in the background) or a manual
/// entry with an address and financial figures
pub async fn create_property(
    State(state): State<AppState>,
    payload: Result<Json<CreatePropertyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PropertyResponse>), ApiError> {
    let Json(payload) = payload.map_err(|e| validation_error(e.body_text()))?;
    let new = payload.validate().map_err(|e| {
        tracing::warn!("Rejected property: {}", e);
        validation_error(e)
    })?;

    let property = state.properties.create(new).await?;
    Ok((StatusCode::CREATED, Json(to_response(&property))))
}

/// Handler for PATCH /api/properties/{id}
pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePropertyRequest>, JsonRejection>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| validation_error(e.body_text()))?;
    let patch = payload.validate().map_err(validation_error)?;

    let property = state.properties.update(&id, patch).await?;
    Ok(Json(to_response(&property)))
}

/// Handler for DELETE /api/properties/{id}
/// Removes the property and its whole history
pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.properties.delete(&id).await?;
    Ok(Json(MessageResponse {
        message: "Property deleted successfully".to_string(),
    }))
}

/// Handler for GET /api/properties/{id}/history?days=30
pub async fn get_property_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<HistoryEntryResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| validation_error(e.body_text()))?;
    let days = query.validate().map_err(validation_error)?;

    let entries = state.properties.history(&id, days).await?;
    Ok(Json(entries.iter().map(HistoryEntryResponse::from).collect()))
}

/// Handler for POST /api/properties/{id}/refresh
/// Re-ingests the listing now and returns the updated property
pub async fn refresh_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PropertyResponse>, ApiError> {
    tracing::info!(property_id = %id, "Manual refresh requested");
    let property = state.properties.refresh(&id).await?;
    Ok(Json(to_response(&property)))
}
