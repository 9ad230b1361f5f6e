pub mod parser;
pub mod property_listing;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use property_listing::ListingScraper;

/// Attributes resolved from a listing URL (and its page, when reachable)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedProperty {
    pub address: Option<String>,
    pub suburb: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub image_url: Option<String>,
    pub dwelling_type: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub parking: Option<i32>,
    /// None when the page was unreachable or carried no estimate
    pub current_value: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub timeout_secs: u64,
    pub retry_max: u32,
    pub retry_delay_ms: u64,
    /// Pause before every page fetch
    pub request_delay_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_max: 3,
            retry_delay_ms: 1000,
            request_delay_ms: 1000,
        }
    }
}

/// Error types for ingestion
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionError {
    Timeout(String),
    Network(String),
    /// The HTTP client could not be constructed
    Client(String),
}

impl std::fmt::Display for IngestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionError::Timeout(url) => write!(f, "Timeout fetching {}", url),
            IngestionError::Network(msg) => write!(f, "Network error: {}", msg),
            IngestionError::Client(msg) => write!(f, "HTTP client error: {}", msg),
        }
    }
}

impl std::error::Error for IngestionError {}

/// Resolves a listing URL into property attributes.
#[async_trait]
pub trait PropertyIngestor: Send + Sync {
    async fn ingest(&self, url: &str) -> Result<ScrapedProperty, IngestionError>;
}
