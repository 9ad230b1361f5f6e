//! SeaORM (Postgres) store
//!
//! History rows are removed by the `ON DELETE CASCADE` foreign key; the
//! delete still runs inside a transaction so a property and its history
//! disappear together even where the constraint is missing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::debug;

use super::{PropertyStore, StoreError};
use crate::entities::{prelude::*, properties, property_history};
use crate::models::history::HistoryEntry;
use crate::models::property::{
    Property, PropertyFilter, PropertyStatus, PropertyType, RentFrequency,
};

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_write_err(err: DbErr, url: Option<&str>) -> StoreError {
    match (err.sql_err(), url) {
        (Some(SqlErr::UniqueConstraintViolation(_)), Some(url)) => {
            StoreError::DuplicateUrl(url.to_string())
        }
        _ => StoreError::from(err),
    }
}

impl TryFrom<properties::Model> for Property {
    type Error = StoreError;

    fn try_from(model: properties::Model) -> Result<Self, Self::Error> {
        let property_type = PropertyType::from_str(&model.property_type).ok_or_else(|| {
            StoreError::CorruptRecord(format!(
                "property {} has property_type '{}'",
                model.id, model.property_type
            ))
        })?;
        let rent_frequency = RentFrequency::from_str(&model.rent_frequency).ok_or_else(|| {
            StoreError::CorruptRecord(format!(
                "property {} has rent_frequency '{}'",
                model.id, model.rent_frequency
            ))
        })?;
        let status = PropertyStatus::from_str(&model.status).ok_or_else(|| {
            StoreError::CorruptRecord(format!(
                "property {} has status '{}'",
                model.id, model.status
            ))
        })?;

        Ok(Property {
            id: model.id,
            url: model.url,
            address: model.address,
            nickname: model.nickname,
            property_type,
            dwelling_type: model.dwelling_type,
            image_url: model.image_url,
            bedrooms: model.bedrooms,
            bathrooms: model.bathrooms,
            parking: model.parking,
            suburb: model.suburb,
            state: model.state,
            postcode: model.postcode,
            current_value: model.current_value,
            previous_value: model.previous_value,
            outstanding_loan: model.outstanding_loan,
            monthly_loan_repayment: model.monthly_loan_repayment,
            rent_amount: model.rent_amount,
            rent_frequency,
            yearly_expenses: model.yearly_expenses,
            status,
            last_updated: model.last_updated.with_timezone(&Utc),
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

fn to_active_model(property: &Property) -> properties::ActiveModel {
    properties::ActiveModel {
        id: Set(property.id.clone()),
        url: Set(property.url.clone()),
        address: Set(property.address.clone()),
        nickname: Set(property.nickname.clone()),
        property_type: Set(property.property_type.as_str().to_string()),
        dwelling_type: Set(property.dwelling_type.clone()),
        image_url: Set(property.image_url.clone()),
        bedrooms: Set(property.bedrooms),
        bathrooms: Set(property.bathrooms),
        parking: Set(property.parking),
        suburb: Set(property.suburb.clone()),
        state: Set(property.state.clone()),
        postcode: Set(property.postcode.clone()),
        current_value: Set(property.current_value),
        previous_value: Set(property.previous_value),
        outstanding_loan: Set(property.outstanding_loan),
        monthly_loan_repayment: Set(property.monthly_loan_repayment),
        rent_amount: Set(property.rent_amount),
        rent_frequency: Set(property.rent_frequency.as_str().to_string()),
        yearly_expenses: Set(property.yearly_expenses),
        status: Set(property.status.as_str().to_string()),
        last_updated: Set(property.last_updated.into()),
        created_at: Set(property.created_at.into()),
    }
}

impl From<property_history::Model> for HistoryEntry {
    fn from(model: property_history::Model) -> Self {
        HistoryEntry {
            id: model.id,
            property_id: model.property_id,
            recorded_at: model.recorded_at.with_timezone(&Utc),
            value: model.value,
            loan: model.loan,
            net_value: model.net_value,
        }
    }
}

fn history_active_model(entry: &HistoryEntry) -> property_history::ActiveModel {
    property_history::ActiveModel {
        id: Set(entry.id.clone()),
        property_id: Set(entry.property_id.clone()),
        value: Set(entry.value),
        loan: Set(entry.loan),
        net_value: Set(entry.net_value),
        recorded_at: Set(entry.recorded_at.into()),
    }
}

/// `%term%` with LIKE wildcards in `term` matched literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Case-insensitive substring match on a text column
fn lower_contains(column: properties::Column, term: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(like_pattern(term))
}

async fn insert_history<C: ConnectionTrait>(conn: &C, entry: &HistoryEntry) -> Result<(), DbErr> {
    PropertyHistory::insert(history_active_model(entry))
        .exec(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl PropertyStore for SeaOrmStore {
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>, StoreError> {
        let mut condition = Condition::all();

        if let Some(property_type) = filter.property_type {
            condition = condition.add(properties::Column::PropertyType.eq(property_type.as_str()));
        }
        if let Some(suburb) = &filter.suburb {
            condition = condition.add(lower_contains(properties::Column::Suburb, suburb));
        }
        if let Some(term) = &filter.search {
            condition = condition.add(
                Condition::any()
                    .add(lower_contains(properties::Column::Address, term))
                    .add(lower_contains(properties::Column::Nickname, term))
                    .add(lower_contains(properties::Column::Suburb, term)),
            );
        }

        let models = Properties::find()
            .filter(condition)
            .order_by_desc(properties::Column::CreatedAt)
            .order_by_asc(properties::Column::Id)
            .all(&self.db)
            .await?;

        models.into_iter().map(Property::try_from).collect()
    }

    async fn get_property(&self, id: &str) -> Result<Option<Property>, StoreError> {
        Properties::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(Property::try_from)
            .transpose()
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Property>, StoreError> {
        Properties::find()
            .filter(properties::Column::Url.eq(url))
            .one(&self.db)
            .await?
            .map(Property::try_from)
            .transpose()
    }

    async fn insert_property(
        &self,
        property: &Property,
        history: Option<&HistoryEntry>,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        to_active_model(property)
            .insert(&txn)
            .await
            .map_err(|e| map_write_err(e, property.url.as_deref()))?;
        if let Some(entry) = history {
            insert_history(&txn, entry).await?;
        }

        txn.commit().await?;
        debug!(property_id = %property.id, "Inserted property");
        Ok(())
    }

    async fn update_property(
        &self,
        property: &Property,
        history: Option<&HistoryEntry>,
    ) -> Result<bool, StoreError> {
        let txn = self.db.begin().await?;

        let result = Properties::update_many()
            .set(to_active_model(property))
            .filter(properties::Column::Id.eq(property.id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| map_write_err(e, property.url.as_deref()))?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }
        if let Some(entry) = history {
            insert_history(&txn, entry).await?;
        }

        txn.commit().await?;
        Ok(true)
    }

    async fn delete_property(&self, id: &str) -> Result<bool, StoreError> {
        let txn = self.db.begin().await?;

        let history = PropertyHistory::delete_many()
            .filter(property_history::Column::PropertyId.eq(id))
            .exec(&txn)
            .await?;
        let result = Properties::delete_by_id(id.to_string()).exec(&txn).await?;

        txn.commit().await?;
        debug!(
            property_id = %id,
            history_rows = history.rows_affected,
            "Deleted property"
        );
        Ok(result.rows_affected > 0)
    }

    async fn property_history(
        &self,
        property_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows = PropertyHistory::find()
            .filter(property_history::Column::PropertyId.eq(property_id))
            .filter(property_history::Column::RecordedAt.gte(since))
            .order_by_asc(property_history::Column::RecordedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }

    async fn history_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows = PropertyHistory::find()
            .filter(property_history::Column::RecordedAt.gte(since))
            .order_by_asc(property_history::Column::RecordedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }

    async fn replace_all(
        &self,
        properties: &[Property],
        history: &[HistoryEntry],
    ) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        PropertyHistory::delete_many().exec(&txn).await?;
        Properties::delete_many().exec(&txn).await?;
        for property in properties {
            to_active_model(property)
                .insert(&txn)
                .await
                .map_err(|e| map_write_err(e, property.url.as_deref()))?;
        }
        if !history.is_empty() {
            PropertyHistory::insert_many(history.iter().map(history_active_model))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        debug!(
            properties = properties.len(),
            history_rows = history.len(),
            "Replaced all properties"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound};
    use rust_decimal_macros::dec;
    use sea_orm::TryIntoModel;

    fn full_property() -> Property {
        let now = Utc::now().trunc_subsecs(0);
        let mut property = Property::new(
            "45 Chapel Street, South Yarra VIC 3141".to_string(),
            PropertyType::Investment,
            now - Duration::days(3),
        );
        property.url = Some("https://www.example.com/property/45-chapel-street/".to_string());
        property.nickname = Some("Melbourne Investment".to_string());
        property.dwelling_type = Some("Townhouse".to_string());
        property.bedrooms = Some(3);
        property.bathrooms = Some(1);
        property.parking = Some(2);
        property.suburb = Some("South Yarra".to_string());
        property.state = Some("VIC".to_string());
        property.postcode = Some("3141".to_string());
        property.current_value = Some(dec!(980000));
        property.previous_value = Some(dec!(985000.50));
        property.outstanding_loan = Some(dec!(640000));
        property.monthly_loan_repayment = Some(dec!(4100));
        property.rent_amount = Some(dec!(780));
        property.rent_frequency = RentFrequency::Weekly;
        property.yearly_expenses = Some(dec!(9500));
        property.status = PropertyStatus::Pending;
        property.last_updated = now;
        property
    }

    fn stored_model(property: &Property) -> properties::Model {
        to_active_model(property).try_into_model().unwrap()
    }

    #[test]
    fn test_property_model_round_trip() {
        let property = full_property();
        let model = stored_model(&property);

        assert_eq!(model.property_type, "investment");
        assert_eq!(model.rent_frequency, "weekly");
        assert_eq!(model.status, "pending");
        assert_eq!(Property::try_from(model).unwrap(), property);
    }

    #[test]
    fn test_corrupt_enum_columns() {
        let property = full_property();

        let mut model = stored_model(&property);
        model.property_type = "holiday".to_string();
        match Property::try_from(model) {
            Err(StoreError::CorruptRecord(msg)) => assert!(msg.contains("property_type 'holiday'")),
            other => panic!("expected CorruptRecord, got {:?}", other),
        }

        let mut model = stored_model(&property);
        model.status = "archived".to_string();
        assert!(matches!(
            Property::try_from(model),
            Err(StoreError::CorruptRecord(_))
        ));

        let mut model = stored_model(&property);
        model.rent_frequency = "fortnightly".to_string();
        assert!(matches!(
            Property::try_from(model),
            Err(StoreError::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_history_model_round_trip() {
        let recorded_at = Utc::now().trunc_subsecs(0);
        let entry = HistoryEntry::new("p1", recorded_at, dec!(714000), Some(dec!(500000)));
        let model = history_active_model(&entry).try_into_model().unwrap();

        assert_eq!(model.net_value, Some(dec!(214000)));
        assert_eq!(HistoryEntry::from(model), entry);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("sydney"), "%sydney%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_non_unique_write_error_is_a_database_error() {
        let err = map_write_err(
            DbErr::Custom("connection reset".to_string()),
            Some("https://www.example.com/property/1/"),
        );
        assert!(matches!(err, StoreError::DatabaseError(_)));
    }
}
