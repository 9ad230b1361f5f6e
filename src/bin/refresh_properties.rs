//! One-shot refresh of every URL-tracked property
//!
//! Runs the same pass as the scheduled job, against DATABASE_URL.
//!
//! Usage: cargo run --bin refresh_properties

use sea_orm::Database;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proptrack_backend::config::AppConfig;
use proptrack_backend::scrapers::ListingScraper;
use proptrack_backend::services::property_service::PropertyService;
use proptrack_backend::store::SeaOrmStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,proptrack_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let database_url = config
        .database_url
        .clone()
        .ok_or("DATABASE_URL must be set")?;

    let db = Database::connect(database_url.as_str()).await?;
    let store = Arc::new(SeaOrmStore::new(db));
    let ingestor = Arc::new(ListingScraper::new(config.scraper.clone())?);
    let service = PropertyService::new(store, ingestor);

    let summary = service.refresh_all(config.refresh.delay).await?;
    println!(
        "Refreshed {} properties ({} failed)",
        summary.refreshed, summary.failed
    );

    Ok(())
}
