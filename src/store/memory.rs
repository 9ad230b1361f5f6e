//! In-process store
//!
//! Used by the test suite and when no DATABASE_URL is configured. Data is
//! lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{PropertyStore, StoreError};
use crate::models::history::HistoryEntry;
use crate::models::property::{Property, PropertyFilter};

#[derive(Debug, Default)]
struct MemoryState {
    properties: HashMap<String, Property>,
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn url_taken(state: &MemoryState, url: &str, except_id: &str) -> bool {
        state
            .properties
            .values()
            .any(|p| p.id != except_id && p.url.as_deref() == Some(url))
    }
}

fn sorted_by_time(mut entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    entries.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
    entries
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>, StoreError> {
        let state = self.state.read();
        let mut properties: Vec<Property> = state
            .properties
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        properties.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(properties)
    }

    async fn get_property(&self, id: &str) -> Result<Option<Property>, StoreError> {
        Ok(self.state.read().properties.get(id).cloned())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Property>, StoreError> {
        Ok(self
            .state
            .read()
            .properties
            .values()
            .find(|p| p.url.as_deref() == Some(url))
            .cloned())
    }

    async fn insert_property(
        &self,
        property: &Property,
        history: Option<&HistoryEntry>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();

        if let Some(url) = property.url.as_deref() {
            if Self::url_taken(&state, url, &property.id) {
                return Err(StoreError::DuplicateUrl(url.to_string()));
            }
        }
        if state.properties.contains_key(&property.id) {
            return Err(StoreError::DatabaseError(format!(
                "duplicate property id {}",
                property.id
            )));
        }

        state.properties.insert(property.id.clone(), property.clone());
        if let Some(entry) = history {
            state.history.push(entry.clone());
        }
        Ok(())
    }

    async fn update_property(
        &self,
        property: &Property,
        history: Option<&HistoryEntry>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write();

        if !state.properties.contains_key(&property.id) {
            return Ok(false);
        }
        if let Some(url) = property.url.as_deref() {
            if Self::url_taken(&state, url, &property.id) {
                return Err(StoreError::DuplicateUrl(url.to_string()));
            }
        }

        state.properties.insert(property.id.clone(), property.clone());
        if let Some(entry) = history {
            state.history.push(entry.clone());
        }
        Ok(true)
    }

    async fn delete_property(&self, id: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        if state.properties.remove(id).is_none() {
            return Ok(false);
        }
        state.history.retain(|entry| entry.property_id != id);
        Ok(true)
    }

    async fn property_history(
        &self,
        property_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let state = self.state.read();
        Ok(sorted_by_time(
            state
                .history
                .iter()
                .filter(|e| e.property_id == property_id && e.recorded_at >= since)
                .cloned()
                .collect(),
        ))
    }

    async fn history_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryEntry>, StoreError> {
        let state = self.state.read();
        Ok(sorted_by_time(
            state
                .history
                .iter()
                .filter(|e| e.recorded_at >= since)
                .cloned()
                .collect(),
        ))
    }

    async fn replace_all(
        &self,
        properties: &[Property],
        history: &[HistoryEntry],
    ) -> Result<(), StoreError> {
        let mut next = MemoryState::default();
        for property in properties {
            if let Some(url) = property.url.as_deref() {
                if Self::url_taken(&next, url, &property.id) {
                    return Err(StoreError::DuplicateUrl(url.to_string()));
                }
            }
            next.properties.insert(property.id.clone(), property.clone());
        }
        if let Some(orphan) = history
            .iter()
            .find(|e| !next.properties.contains_key(&e.property_id))
        {
            return Err(StoreError::DatabaseError(format!(
                "history references unknown property {}",
                orphan.property_id
            )));
        }
        next.history = history.to_vec();

        *self.state.write() = next;
        Ok(())
    }
}
