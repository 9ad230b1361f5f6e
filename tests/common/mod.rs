use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use proptrack_backend::scrapers::{IngestionError, PropertyIngestor, ScrapedProperty};
use proptrack_backend::services::property_service::PropertyService;
use proptrack_backend::store::MemoryStore;
use proptrack_backend::{build_router, AppState};

/// Ingestor returning canned values per URL.
///
/// URLs containing "unreachable" fail; unknown URLs yield no value.
#[derive(Default)]
#[allow(dead_code)]
pub struct StubIngestor {
    values: Mutex<HashMap<String, Decimal>>,
}

#[allow(dead_code)]
impl StubIngestor {
    pub fn set_value(&self, url: &str, value: Decimal) {
        self.values.lock().insert(url.to_string(), value);
    }
}

#[async_trait]
impl PropertyIngestor for StubIngestor {
    async fn ingest(&self, url: &str) -> Result<ScrapedProperty, IngestionError> {
        if url.contains("unreachable") {
            return Err(IngestionError::Timeout(url.to_string()));
        }
        Ok(ScrapedProperty {
            image_url: Some("https://img.example.com/listing.jpg".to_string()),
            current_value: self.values.lock().get(url).copied(),
            ..Default::default()
        })
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    #[allow(dead_code)]
    pub ingestor: Arc<StubIngestor>,
}

/// Router over an empty in-memory store
#[allow(dead_code)]
pub fn test_app() -> TestApp {
    let ingestor = Arc::new(StubIngestor::default());
    let properties = Arc::new(PropertyService::new(
        Arc::new(MemoryStore::new()),
        ingestor.clone(),
    ));

    TestApp {
        router: build_router(AppState { properties }),
        ingestor,
    }
}

/// Connect to TEST_DATABASE_URL and bring its schema up to date.
/// Returns None when the variable is unset so database tests can skip.
#[allow(dead_code)]
pub async fn setup_test_db() -> Option<DatabaseConnection> {
    let database_url = env::var("TEST_DATABASE_URL").ok()?;
    let db = Database::connect(database_url.as_str())
        .await
        .expect("Test database connection should succeed");
    migration::Migrator::up(&db, None)
        .await
        .expect("Test database migrations should apply");
    Some(db)
}
