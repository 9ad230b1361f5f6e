//! SeaORM Entity for tracked properties
//!
//! One row per tracked real-estate asset. Derived figures (net value,
//! daily change, cash flow) are never stored here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    /// UUID v4 string
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Listing URL (None for manual entries)
    #[sea_orm(unique)]
    pub url: Option<String>,
    pub address: String,
    pub nickname: Option<String>,
    /// "investment" or "ppor"
    pub property_type: String,
    /// Building kind from the listing (e.g. "Apartment")
    pub dwelling_type: Option<String>,
    pub image_url: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub parking: Option<i32>,
    pub suburb: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub current_value: Option<Decimal>,
    pub previous_value: Option<Decimal>,
    pub outstanding_loan: Option<Decimal>,
    pub monthly_loan_repayment: Option<Decimal>,
    pub rent_amount: Option<Decimal>,
    /// "weekly" or "monthly"
    pub rent_frequency: String,
    pub yearly_expenses: Option<Decimal>,
    /// "pending", "active" or "error"
    pub status: String,
    pub last_updated: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::property_history::Entity")]
    PropertyHistory,
}

impl Related<super::property_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PropertyHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
