//! Property and history persistence
//!
//! `PropertyStore` is the seam between the lifecycle manager and storage.
//! `SeaOrmStore` backs it with Postgres; `MemoryStore` keeps everything in
//! process for tests and for running without a database.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::history::HistoryEntry;
use crate::models::property::{Property, PropertyFilter};

pub use memory::MemoryStore;
pub use postgres::SeaOrmStore;

/// Error types for store operations
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A property with the same listing URL already exists
    DuplicateUrl(String),
    DatabaseError(String),
    /// A stored row could not be mapped back to the domain
    CorruptRecord(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateUrl(url) => write!(f, "Property already being tracked: {}", url),
            StoreError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            StoreError::CorruptRecord(msg) => write!(f, "Corrupt record: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Matching properties, newest `created_at` first
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>, StoreError>;

    async fn get_property(&self, id: &str) -> Result<Option<Property>, StoreError>;

    async fn find_by_url(&self, url: &str) -> Result<Option<Property>, StoreError>;

    /// Insert a new property, optionally with its first history entry.
    async fn insert_property(
        &self,
        property: &Property,
        history: Option<&HistoryEntry>,
    ) -> Result<(), StoreError>;

    /// Overwrite a stored property, optionally appending a history entry in
    /// the same write. Returns false when the property no longer exists.
    async fn update_property(
        &self,
        property: &Property,
        history: Option<&HistoryEntry>,
    ) -> Result<bool, StoreError>;

    /// Delete a property and all of its history. Returns false when absent.
    async fn delete_property(&self, id: &str) -> Result<bool, StoreError>;

    /// History of one property recorded at or after `since`, oldest first
    async fn property_history(
        &self,
        property_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>, StoreError>;

    /// History of every property recorded at or after `since`, oldest first
    async fn history_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Swap the whole dataset for `properties` and `history` in one write.
    /// On error the previous data is left in place.
    async fn replace_all(
        &self,
        properties: &[Property],
        history: &[HistoryEntry],
    ) -> Result<(), StoreError>;
}
