// src/lib.rs

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use services::property_service::PropertyService;

#[derive(Clone)]
pub struct AppState {
    pub properties: Arc<PropertyService>,
}

pub mod config;

pub mod entities {
    pub mod prelude;
    pub mod properties;
    pub mod property_history;
}

pub mod services {
    pub mod demo_seed;
    pub mod history_aggregator;
    pub mod metrics;
    pub mod property_locks;
    pub mod property_service;
}

pub mod handlers;
pub mod jobs;
pub mod models;
pub mod scrapers;
pub mod store;

/// All API routes, mounted under `/api`
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/properties",
            get(handlers::properties::list_properties).post(handlers::properties::create_property),
        )
        .route(
            "/properties/{id}",
            get(handlers::properties::get_property)
                .patch(handlers::properties::update_property)
                .delete(handlers::properties::delete_property),
        )
        .route(
            "/properties/{id}/history",
            get(handlers::properties::get_property_history),
        )
        .route(
            "/properties/{id}/refresh",
            post(handlers::properties::refresh_property),
        )
        .route("/portfolio/stats", get(handlers::portfolio::get_portfolio_stats))
        .route("/stats", get(handlers::portfolio::get_portfolio_stats))
        .route("/portfolio/history", get(handlers::portfolio::get_portfolio_history))
        .route("/demo/seed", post(handlers::demo::seed_demo_data));

    Router::new()
        .route("/api", get(handlers::root))
        .route("/api/", get(handlers::root))
        .nest("/api", api)
        .with_state(state)
}
