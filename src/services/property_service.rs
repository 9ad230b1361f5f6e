//! Property lifecycle manager
//!
//! Owns every mutation of a tracked property: creation (manual or from a
//! listing URL), edits, deletion, refresh and background ingestion.
//! Mutations of one property are serialized through `PropertyLocks`.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::demo_seed;
use super::history_aggregator::{build_portfolio_history, filter_by_window};
use super::metrics::{aggregate_portfolio_stats, PortfolioStats};
use super::property_locks::PropertyLocks;
use crate::models::history::{HistoryEntry, HistoryScope, PortfolioHistoryPoint};
use crate::models::property::{
    NewProperty, Property, PropertyFilter, PropertyPatch, PropertyStatus,
};
use crate::scrapers::{IngestionError, PropertyIngestor, ScrapedProperty};
use crate::store::{PropertyStore, StoreError};

/// Error types for property operations
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyError {
    Validation(String),
    NotFound(String),
    Ingestion(IngestionError),
    Store(StoreError),
}

impl std::fmt::Display for PropertyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyError::Validation(msg) => write!(f, "{}", msg),
            PropertyError::NotFound(id) => write!(f, "Property not found: {}", id),
            PropertyError::Ingestion(e) => write!(f, "Ingestion failed: {}", e),
            PropertyError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PropertyError {}

impl From<StoreError> for PropertyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUrl(_) => {
                PropertyError::Validation("Property already being tracked".to_string())
            }
            other => PropertyError::Store(other),
        }
    }
}

impl From<IngestionError> for PropertyError {
    fn from(err: IngestionError) -> Self {
        PropertyError::Ingestion(err)
    }
}

/// Outcome of a refresh pass over every URL-tracked property
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

pub struct PropertyService {
    store: Arc<dyn PropertyStore>,
    ingestor: Arc<dyn PropertyIngestor>,
    locks: PropertyLocks,
}

impl PropertyService {
    pub fn new(store: Arc<dyn PropertyStore>, ingestor: Arc<dyn PropertyIngestor>) -> Self {
        Self {
            store,
            ingestor,
            locks: PropertyLocks::new(),
        }
    }

    pub async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, PropertyError> {
        Ok(self.store.list_properties(filter).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Property, PropertyError> {
        self.store
            .get_property(id)
            .await?
            .ok_or_else(|| PropertyError::NotFound(id.to_string()))
    }

    /// Create a property.
    ///
    /// Manual entries are active at once. Listing URLs start `pending` and
    /// are ingested in the background.
    pub async fn create(self: &Arc<Self>, new: NewProperty) -> Result<Property, PropertyError> {
        let now = Utc::now();

        match new {
            NewProperty::Manual(entry) => {
                let mut property = Property::new(entry.address, entry.property_type, now);
                property.nickname = entry.nickname;
                property.suburb = entry.suburb;
                property.state = entry.state;
                property.postcode = entry.postcode;

                let financials = entry.financials;
                property.current_value = financials.current_value;
                property.outstanding_loan = financials.outstanding_loan;
                property.monthly_loan_repayment = financials.monthly_loan_repayment;
                property.rent_amount = financials.rent_amount;
                property.rent_frequency = financials.rent_frequency;
                property.yearly_expenses = financials.yearly_expenses;

                let initial = property.current_value.map(|value| {
                    HistoryEntry::new(&property.id, now, value, property.outstanding_loan)
                });

                self.store.insert_property(&property, initial.as_ref()).await?;
                info!(property_id = %property.id, "Created manual property entry");
                Ok(property)
            }
            NewProperty::Listing {
                url,
                nickname,
                property_type,
            } => {
                if self.store.find_by_url(&url).await?.is_some() {
                    return Err(PropertyError::Validation(
                        "Property already being tracked".to_string(),
                    ));
                }

                let parsed = crate::scrapers::parser::parse_address_from_url(&url);
                let mut property =
                    Property::new(parsed.address.unwrap_or_else(|| url.clone()), property_type, now);
                property.url = Some(url);
                property.nickname = nickname;
                property.suburb = parsed.suburb;
                property.state = parsed.state;
                property.postcode = parsed.postcode;
                property.status = PropertyStatus::Pending;

                self.store.insert_property(&property, None).await?;
                info!(property_id = %property.id, "Tracking listing, ingestion scheduled");

                let service = Arc::clone(self);
                let id = property.id.clone();
                tokio::spawn(async move {
                    service.ingest_initial(&id).await;
                });

                Ok(property)
            }
        }
    }

    /// First ingestion of a freshly tracked listing. Failures leave the
    /// property in `error`.
    pub async fn ingest_initial(&self, id: &str) {
        match self.refresh(id).await {
            Ok(property) => {
                info!(property_id = %id, status = property.status.as_str(), "Initial ingestion complete")
            }
            Err(PropertyError::NotFound(_)) => {
                debug!(property_id = %id, "Property removed before ingestion")
            }
            Err(e) => error!(property_id = %id, error = %e, "Initial ingestion failed"),
        }
    }

    /// Partial update. Derived figures are recomputed on read, so nothing
    /// else changes and no history is recorded.
    pub async fn update(&self, id: &str, patch: PropertyPatch) -> Result<Property, PropertyError> {
        let _guard = self.locks.acquire(id).await;

        let mut property = self.get(id).await?;
        if patch.is_empty() {
            return Ok(property);
        }

        patch.apply_to(&mut property);
        property.last_updated = Utc::now();

        if !self.store.update_property(&property, None).await? {
            return Err(PropertyError::NotFound(id.to_string()));
        }
        info!(property_id = %id, "Updated property");
        Ok(property)
    }

    /// Delete a property together with its history.
    pub async fn delete(&self, id: &str) -> Result<(), PropertyError> {
        let _guard = self.locks.acquire(id).await;

        if !self.store.delete_property(id).await? {
            return Err(PropertyError::NotFound(id.to_string()));
        }
        info!(property_id = %id, "Deleted property");
        Ok(())
    }

    /// Re-ingest a URL-tracked property.
    ///
    /// A value from the ingestor shifts current to previous and appends
    /// exactly one history entry. On failure the stored fields are left as
    /// they were, except that a property still `pending` moves to `error`.
    pub async fn refresh(&self, id: &str) -> Result<Property, PropertyError> {
        let _guard = self.locks.acquire(id).await;

        let mut property = self.get(id).await?;
        let url = property.url.clone().ok_or_else(|| {
            PropertyError::Validation("Only URL-tracked properties can be refreshed".to_string())
        })?;

        let scraped = match self.ingestor.ingest(&url).await {
            Ok(scraped) => scraped,
            Err(e) => {
                warn!(property_id = %id, error = %e, "Ingestion failed");
                if property.status == PropertyStatus::Pending {
                    property.status = PropertyStatus::Error;
                    property.last_updated = Utc::now();
                    self.store.update_property(&property, None).await?;
                }
                return Err(e.into());
            }
        };

        let entry = apply_ingestion(&mut property, scraped, Utc::now());
        if !self.store.update_property(&property, entry.as_ref()).await? {
            return Err(PropertyError::NotFound(id.to_string()));
        }

        debug!(
            property_id = %id,
            value = ?property.current_value,
            recorded = entry.is_some(),
            "Refreshed property"
        );
        Ok(property)
    }

    /// Refresh every URL-tracked property one after another, pausing
    /// `delay` between properties. Individual failures do not stop the pass.
    pub async fn refresh_all(&self, delay: std::time::Duration) -> Result<RefreshSummary, PropertyError> {
        let tracked: Vec<String> = self
            .store
            .list_properties(&PropertyFilter::default())
            .await?
            .into_iter()
            .filter(|p| p.url.is_some())
            .map(|p| p.id)
            .collect();

        info!("Refreshing {} tracked properties", tracked.len());
        let mut summary = RefreshSummary::default();

        for (i, id) in tracked.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.refresh(id).await {
                Ok(_) => summary.refreshed += 1,
                Err(e) => {
                    warn!(property_id = %id, error = %e, "Scheduled refresh failed");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// History of one property within the last `days` days, oldest first.
    pub async fn history(&self, id: &str, days: i64) -> Result<Vec<HistoryEntry>, PropertyError> {
        self.get(id).await?;

        let now = Utc::now();
        let entries = self.store.property_history(id, window_start(days, now)).await?;
        Ok(filter_by_window(&entries, days, now))
    }

    pub async fn portfolio_stats(&self) -> Result<PortfolioStats, PropertyError> {
        let properties = self.store.list_properties(&PropertyFilter::default()).await?;
        Ok(aggregate_portfolio_stats(&properties))
    }

    pub async fn portfolio_history(
        &self,
        days: i64,
        scope: HistoryScope,
    ) -> Result<Vec<PortfolioHistoryPoint>, PropertyError> {
        let now = Utc::now();
        let mut entries = self.store.history_since(window_start(days, now)).await?;

        if scope == HistoryScope::Investment {
            let investment_ids: HashSet<String> = self
                .store
                .list_properties(&PropertyFilter::default())
                .await?
                .into_iter()
                .filter(Property::is_investment)
                .map(|p| p.id)
                .collect();
            entries.retain(|e| investment_ids.contains(&e.property_id));
        }

        Ok(build_portfolio_history(&entries, days, now))
    }

    /// Replace all data with the demo portfolio. Returns the property count.
    pub async fn seed_demo(&self) -> Result<usize, PropertyError> {
        let (properties, history) = demo_seed::demo_portfolio(Utc::now());

        self.store.replace_all(&properties, &history).await?;

        info!(
            properties = properties.len(),
            history_entries = history.len(),
            "Seeded demo portfolio"
        );
        Ok(properties.len())
    }
}

fn window_start(days: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// Merge ingested attributes into `property`. Returns the history entry to
/// record when a value was obtained.
fn apply_ingestion(
    property: &mut Property,
    scraped: ScrapedProperty,
    now: DateTime<Utc>,
) -> Option<HistoryEntry> {
    if let Some(address) = scraped.address.filter(|a| !a.trim().is_empty()) {
        property.address = address;
    }
    if scraped.image_url.is_some() {
        property.image_url = scraped.image_url;
    }
    if scraped.suburb.is_some() {
        property.suburb = scraped.suburb;
    }
    if scraped.state.is_some() {
        property.state = scraped.state;
    }
    if scraped.postcode.is_some() {
        property.postcode = scraped.postcode;
    }
    if scraped.dwelling_type.is_some() {
        property.dwelling_type = scraped.dwelling_type;
    }
    if scraped.bedrooms.is_some() {
        property.bedrooms = scraped.bedrooms;
    }
    if scraped.bathrooms.is_some() {
        property.bathrooms = scraped.bathrooms;
    }
    if scraped.parking.is_some() {
        property.parking = scraped.parking;
    }

    property.status = PropertyStatus::Active;
    property.last_updated = now;

    scraped.current_value.map(|value| {
        property.previous_value = property.current_value;
        property.current_value = Some(value);
        HistoryEntry::new(&property.id, now, value, property.outstanding_loan)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::{Financials, ManualEntry, PropertyType};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;

    /// Replays queued ingestion results; once empty, yields no value
    #[derive(Default)]
    struct ScriptedIngestor {
        results: Mutex<VecDeque<Result<ScrapedProperty, IngestionError>>>,
    }

    impl ScriptedIngestor {
        fn push_value(&self, value: Decimal) {
            self.results.lock().push_back(Ok(ScrapedProperty {
                current_value: Some(value),
                ..Default::default()
            }));
        }

        fn push_error(&self) {
            self.results
                .lock()
                .push_back(Err(IngestionError::Timeout("test".to_string())));
        }
    }

    #[async_trait]
    impl PropertyIngestor for ScriptedIngestor {
        async fn ingest(&self, _url: &str) -> Result<ScrapedProperty, IngestionError> {
            self.results
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(ScrapedProperty::default()))
        }
    }

    fn service() -> (Arc<PropertyService>, Arc<ScriptedIngestor>) {
        let ingestor = Arc::new(ScriptedIngestor::default());
        let service = Arc::new(PropertyService::new(
            Arc::new(MemoryStore::new()),
            ingestor.clone(),
        ));
        (service, ingestor)
    }

    fn manual(value: Option<Decimal>) -> NewProperty {
        NewProperty::Manual(ManualEntry {
            address: "12 Beach Road, Bondi NSW 2026".to_string(),
            nickname: None,
            property_type: PropertyType::Investment,
            suburb: Some("Bondi".to_string()),
            state: Some("NSW".to_string()),
            postcode: Some("2026".to_string()),
            financials: Financials {
                current_value: value,
                outstanding_loan: Some(dec!(500000)),
                ..Default::default()
            },
        })
    }

    /// A listing-backed property inserted directly, skipping the spawned
    /// initial ingestion
    async fn tracked(service: &PropertyService, status: PropertyStatus) -> Property {
        let mut property = Property::new("1 Test St".to_string(), PropertyType::Investment, Utc::now());
        property.url = Some(format!("https://example.com/{}", property.id));
        property.current_value = Some(dec!(700000));
        property.outstanding_loan = Some(dec!(400000));
        property.status = status;
        service.store.insert_property(&property, None).await.unwrap();
        property
    }

    #[tokio::test]
    async fn test_manual_create_records_initial_history() {
        let (service, _) = service();
        let property = service.create(manual(Some(dec!(750000)))).await.unwrap();

        assert_eq!(property.status, PropertyStatus::Active);
        let history = service.history(&property.id, 30).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, dec!(750000));
        assert_eq!(history[0].net_value, Some(dec!(250000)));

        let without_value = service.create(manual(None)).await.unwrap();
        assert!(service.history(&without_value.id, 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_shifts_value_and_appends_history() {
        let (service, ingestor) = service();
        let property = tracked(&service, PropertyStatus::Active).await;

        ingestor.push_value(dec!(714000));
        let refreshed = service.refresh(&property.id).await.unwrap();
        assert_eq!(refreshed.previous_value, Some(dec!(700000)));
        assert_eq!(refreshed.current_value, Some(dec!(714000)));

        ingestor.push_value(dec!(714000));
        let refreshed = service.refresh(&property.id).await.unwrap();
        assert_eq!(refreshed.previous_value, Some(dec!(714000)));

        let history = service.history(&property.id, 30).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].loan, Some(dec!(400000)));
        assert_eq!(history[1].net_value, Some(dec!(314000)));
    }

    #[tokio::test]
    async fn test_refresh_without_value_keeps_figures() {
        let (service, _) = service();
        let property = tracked(&service, PropertyStatus::Pending).await;

        let refreshed = service.refresh(&property.id).await.unwrap();
        assert_eq!(refreshed.status, PropertyStatus::Active);
        assert_eq!(refreshed.current_value, Some(dec!(700000)));
        assert_eq!(refreshed.previous_value, None);
        assert!(service.history(&property.id, 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_marks_pending_as_error() {
        let (service, ingestor) = service();
        let pending = tracked(&service, PropertyStatus::Pending).await;
        let active = tracked(&service, PropertyStatus::Active).await;

        ingestor.push_error();
        assert!(matches!(
            service.refresh(&pending.id).await,
            Err(PropertyError::Ingestion(_))
        ));
        assert_eq!(service.get(&pending.id).await.unwrap().status, PropertyStatus::Error);

        ingestor.push_error();
        assert!(service.refresh(&active.id).await.is_err());
        let unchanged = service.get(&active.id).await.unwrap();
        assert_eq!(unchanged, active);
    }

    #[tokio::test]
    async fn test_refresh_manual_entry_is_rejected() {
        let (service, _) = service();
        let property = service.create(manual(Some(dec!(750000)))).await.unwrap();

        assert!(matches!(
            service.refresh(&property.id).await,
            Err(PropertyError::Validation(_))
        ));
        assert!(matches!(
            service.refresh("missing").await,
            Err(PropertyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listing_create_rejects_duplicates() {
        let (service, _) = service();
        let url = "https://www.property.com.au/nsw/marsden-park-2765/pratia-cres/46-pid-20583686/";
        let listing = || NewProperty::Listing {
            url: url.to_string(),
            nickname: None,
            property_type: PropertyType::Investment,
        };

        let property = service.create(listing()).await.unwrap();
        assert_eq!(property.status, PropertyStatus::Pending);
        assert_eq!(property.address, "46 Pratia Cres, Marsden Park NSW 2765");

        assert_eq!(
            service.create(listing()).await.unwrap_err(),
            PropertyError::Validation("Property already being tracked".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_is_partial_and_records_no_history() {
        let (service, _) = service();
        let property = service.create(manual(Some(dec!(750000)))).await.unwrap();

        let updated = service
            .update(
                &property.id,
                PropertyPatch {
                    current_value: Some(Some(dec!(800000))),
                    outstanding_loan: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.current_value, Some(dec!(800000)));
        assert_eq!(updated.outstanding_loan, None);
        assert_eq!(updated.previous_value, None);
        assert_eq!(updated.suburb.as_deref(), Some("Bondi"));
        assert_eq!(service.history(&property.id, 30).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_updates_stats() {
        let (service, _) = service();
        let keep = service.create(manual(Some(dec!(750000)))).await.unwrap();
        let gone = service.create(manual(Some(dec!(600000)))).await.unwrap();

        service.delete(&gone.id).await.unwrap();

        assert!(matches!(service.get(&gone.id).await, Err(PropertyError::NotFound(_))));
        assert!(matches!(service.delete(&gone.id).await, Err(PropertyError::NotFound(_))));

        let stats = service.portfolio_stats().await.unwrap();
        assert_eq!(stats.total_properties, 1);
        assert_eq!(stats.total_property_value, dec!(750000));

        let series = service.portfolio_history(30, HistoryScope::All).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].total_value, dec!(750000));
        assert_eq!(service.history(&keep.id, 30).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_are_serialized() {
        let (service, ingestor) = service();
        let property = tracked(&service, PropertyStatus::Active).await;
        ingestor.push_value(dec!(710000));
        ingestor.push_value(dec!(720000));

        let (a, b) = tokio::join!(service.refresh(&property.id), service.refresh(&property.id));
        assert!(a.is_ok() && b.is_ok());

        let stored = service.get(&property.id).await.unwrap();
        assert_eq!(stored.current_value, Some(dec!(720000)));
        assert_eq!(stored.previous_value, Some(dec!(710000)));
        assert_eq!(service.history(&property.id, 30).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_all_continues_past_failures() {
        let (service, ingestor) = service();
        tracked(&service, PropertyStatus::Active).await;
        tracked(&service, PropertyStatus::Active).await;
        service.create(manual(None)).await.unwrap();

        ingestor.push_error();
        ingestor.push_value(dec!(705000));

        let summary = service.refresh_all(std::time::Duration::ZERO).await.unwrap();
        assert_eq!(summary, RefreshSummary { refreshed: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_seed_demo_replaces_data() {
        let (service, _) = service();
        service.create(manual(Some(dec!(1)))).await.unwrap();

        assert_eq!(service.seed_demo().await.unwrap(), 3);

        let stats = service.portfolio_stats().await.unwrap();
        assert_eq!(stats.total_properties, 3);
        assert_eq!(stats.investment_count, 2);
        assert_eq!(stats.ppor_count, 1);

        let series = service.portfolio_history(30, HistoryScope::All).await.unwrap();
        assert!(!series.is_empty());
    }
}
