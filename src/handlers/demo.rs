use axum::{extract::State, Json};

use super::ApiError;
use crate::{models::common::MessageResponse, AppState};

/// Handler for POST /api/demo/seed
/// Wipes all data and loads the demo portfolio
pub async fn seed_demo_data(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let count = state.properties.seed_demo().await?;
    Ok(Json(MessageResponse {
        message: format!("Seeded {} demo properties with history", count),
    }))
}
