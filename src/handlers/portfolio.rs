use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use super::{validation_error, ApiError};
use crate::{
    models::{
        history::{PortfolioHistoryPointResponse, PortfolioHistoryQuery, PortfolioHistoryResponse},
        portfolio::PortfolioStatsResponse,
    },
    AppState,
};

/// Handler for GET /api/portfolio/stats (also served at /api/stats)
pub async fn get_portfolio_stats(
    State(state): State<AppState>,
) -> Result<Json<PortfolioStatsResponse>, ApiError> {
    let stats = state.properties.portfolio_stats().await?;
    Ok(Json(PortfolioStatsResponse::from(&stats)))
}

/// Handler for GET /api/portfolio/history?days=30&scope=all
/// Portfolio totals per calendar date. Dates on which a property has no
/// entry simply leave it out of that date's totals.
pub async fn get_portfolio_history(
    State(state): State<AppState>,
    query: Result<Query<PortfolioHistoryQuery>, QueryRejection>,
) -> Result<Json<PortfolioHistoryResponse>, ApiError> {
    let Query(query) = query.map_err(|e| validation_error(e.body_text()))?;
    let (days, scope) = query.validate().map_err(validation_error)?;

    let points = state.properties.portfolio_history(days, scope).await?;

    Ok(Json(PortfolioHistoryResponse {
        has_data: !points.is_empty(),
        data: points.iter().map(PortfolioHistoryPointResponse::from).collect(),
        days,
        scope,
    }))
}
