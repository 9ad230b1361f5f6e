//! Property request/response models
//!
//! Models for the /api/properties endpoints plus the validated domain
//! `Property` that the store persists and the metrics engine reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{clean_text, parse_money, parse_optional_money, present, to_f64, to_f64_opt};
use crate::services::metrics::{PropertyMetrics, Trend};

/// Investment classification of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Investment,
    /// Primary place of residence
    Ppor,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Investment => "investment",
            PropertyType::Ppor => "ppor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "investment" => Some(PropertyType::Investment),
            "ppor" => Some(PropertyType::Ppor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentFrequency {
    Weekly,
    #[default]
    Monthly,
}

impl RentFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentFrequency::Weekly => "weekly",
            RentFrequency::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Some(RentFrequency::Weekly),
            "monthly" => Some(RentFrequency::Monthly),
            _ => None,
        }
    }
}

/// Ingestion state of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Pending,
    Active,
    Error,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Pending => "pending",
            PropertyStatus::Active => "active",
            PropertyStatus::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PropertyStatus::Pending),
            "active" => Some(PropertyStatus::Active),
            "error" => Some(PropertyStatus::Error),
            _ => None,
        }
    }
}

/// A tracked property as stored. Derived figures live in `PropertyMetrics`.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: String,
    pub url: Option<String>,
    pub address: String,
    pub nickname: Option<String>,
    pub property_type: PropertyType,
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
    pub rent_frequency: RentFrequency,
    pub yearly_expenses: Option<Decimal>,
    pub status: PropertyStatus,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// A blank record with a fresh id, timestamped `now`
    pub fn new(address: String, property_type: PropertyType, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url: None,
            address,
            nickname: None,
            property_type,
            dwelling_type: None,
            image_url: None,
            bedrooms: None,
            bathrooms: None,
            parking: None,
            suburb: None,
            state: None,
            postcode: None,
            current_value: None,
            previous_value: None,
            outstanding_loan: None,
            monthly_loan_repayment: None,
            rent_amount: None,
            rent_frequency: RentFrequency::Monthly,
            yearly_expenses: None,
            status: PropertyStatus::Active,
            last_updated: now,
            created_at: now,
        }
    }

    pub fn is_investment(&self) -> bool {
        self.property_type == PropertyType::Investment
    }
}

/// Optional financial figures supplied with a manual entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Financials {
    pub current_value: Option<Decimal>,
    pub outstanding_loan: Option<Decimal>,
    pub monthly_loan_repayment: Option<Decimal>,
    pub rent_amount: Option<Decimal>,
    pub rent_frequency: RentFrequency,
    pub yearly_expenses: Option<Decimal>,
}

/// Validated manual entry
#[derive(Debug, Clone, PartialEq)]
pub struct ManualEntry {
    pub address: String,
    pub nickname: Option<String>,
    pub property_type: PropertyType,
    pub suburb: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub financials: Financials,
}

/// Validated creation request
#[derive(Debug, Clone, PartialEq)]
pub enum NewProperty {
    /// Track a listing URL; attributes come from ingestion
    Listing {
        url: String,
        nickname: Option<String>,
        property_type: PropertyType,
    },
    Manual(ManualEntry),
}

/// POST /api/properties body. Either `url` or `address` drives the mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePropertyRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub current_value: Option<Value>,
    #[serde(default)]
    pub outstanding_loan: Option<Value>,
    #[serde(default)]
    pub monthly_loan_repayment: Option<Value>,
    #[serde(default)]
    pub rent_amount: Option<Value>,
    #[serde(default)]
    pub rent_frequency: Option<String>,
    #[serde(default)]
    pub yearly_expenses: Option<Value>,
}

impl CreatePropertyRequest {
    pub fn validate(&self) -> Result<NewProperty, String> {
        let address = clean_text(self.address.as_deref());

        if let Some(raw_url) = self.url.as_deref() {
            let url = raw_url.trim();
            if !url.is_empty() {
                let property_type = match clean_text(self.property_type.as_deref()) {
                    Some(raw) => parse_property_type(&raw)?,
                    None => PropertyType::Investment,
                };
                return Ok(NewProperty::Listing {
                    url: validate_listing_url(url)?,
                    nickname: clean_text(self.nickname.as_deref()),
                    property_type,
                });
            }
            if address.is_none() {
                return Err("URL must not be empty".to_string());
            }
        }

        let address =
            address.ok_or_else(|| "Address is required for manual entries".to_string())?;
        let property_type = clean_text(self.property_type.as_deref())
            .ok_or_else(|| "property_type is required (investment or ppor)".to_string())
            .and_then(|raw| parse_property_type(&raw))?;
        let rent_frequency = match clean_text(self.rent_frequency.as_deref()) {
            Some(raw) => parse_rent_frequency(&raw)?,
            None => RentFrequency::default(),
        };

        let financials = Financials {
            current_value: parse_optional_money("current_value", self.current_value.as_ref())?,
            outstanding_loan: parse_optional_money(
                "outstanding_loan",
                self.outstanding_loan.as_ref(),
            )?,
            monthly_loan_repayment: parse_optional_money(
                "monthly_loan_repayment",
                self.monthly_loan_repayment.as_ref(),
            )?,
            rent_amount: parse_optional_money("rent_amount", self.rent_amount.as_ref())?,
            rent_frequency,
            yearly_expenses: parse_optional_money(
                "yearly_expenses",
                self.yearly_expenses.as_ref(),
            )?,
        };

        Ok(NewProperty::Manual(ManualEntry {
            address,
            nickname: clean_text(self.nickname.as_deref()),
            property_type,
            suburb: clean_text(self.suburb.as_deref()),
            state: clean_text(self.state.as_deref()),
            postcode: clean_text(self.postcode.as_deref()),
            financials,
        }))
    }
}

/// Accept absolute http(s) URLs with a host
pub fn validate_listing_url(raw: &str) -> Result<String, String> {
    let parsed = reqwest::Url::parse(raw).map_err(|_| "Invalid URL format".to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err("Invalid URL format".to_string());
    }
    Ok(raw.to_string())
}

fn parse_property_type(raw: &str) -> Result<PropertyType, String> {
    PropertyType::from_str(raw).ok_or_else(|| {
        format!(
            "Invalid property_type: '{}'. Must be one of: investment, ppor",
            raw
        )
    })
}

fn parse_rent_frequency(raw: &str) -> Result<RentFrequency, String> {
    RentFrequency::from_str(raw).ok_or_else(|| {
        format!(
            "Invalid rent_frequency: '{}'. Must be one of: weekly, monthly",
            raw
        )
    })
}

/// PATCH /api/properties/{id} body.
///
/// Absent keys are left untouched; an explicit `null` (or empty string)
/// clears optional fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePropertyRequest {
    #[serde(default, deserialize_with = "present")]
    pub nickname: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub address: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub property_type: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub suburb: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub state: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub postcode: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub current_value: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub outstanding_loan: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub monthly_loan_repayment: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub rent_amount: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub rent_frequency: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub yearly_expenses: Option<Value>,
}

/// Validated partial update. `Some(None)` clears, `None` leaves untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch {
    pub nickname: Option<Option<String>>,
    pub address: Option<String>,
    pub property_type: Option<PropertyType>,
    pub suburb: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub postcode: Option<Option<String>>,
    pub current_value: Option<Option<Decimal>>,
    pub outstanding_loan: Option<Option<Decimal>>,
    pub monthly_loan_repayment: Option<Option<Decimal>>,
    pub rent_amount: Option<Option<Decimal>>,
    pub rent_frequency: Option<RentFrequency>,
    pub yearly_expenses: Option<Option<Decimal>>,
}

impl UpdatePropertyRequest {
    pub fn validate(&self) -> Result<PropertyPatch, String> {
        let address = match &self.address {
            Some(raw) => Some(
                parse_text("address", raw)?
                    .ok_or_else(|| "address must not be empty".to_string())?,
            ),
            None => None,
        };
        let property_type = match &self.property_type {
            Some(raw) => {
                let text = parse_text("property_type", raw)?.ok_or_else(|| {
                    "property_type must be one of: investment, ppor".to_string()
                })?;
                Some(parse_property_type(&text)?)
            }
            None => None,
        };
        let rent_frequency = match &self.rent_frequency {
            Some(raw) => {
                let text = parse_text("rent_frequency", raw)?.ok_or_else(|| {
                    "rent_frequency must be one of: weekly, monthly".to_string()
                })?;
                Some(parse_rent_frequency(&text)?)
            }
            None => None,
        };

        Ok(PropertyPatch {
            nickname: text_patch("nickname", &self.nickname)?,
            address,
            property_type,
            suburb: text_patch("suburb", &self.suburb)?,
            state: text_patch("state", &self.state)?,
            postcode: text_patch("postcode", &self.postcode)?,
            current_value: money_patch("current_value", &self.current_value)?,
            outstanding_loan: money_patch("outstanding_loan", &self.outstanding_loan)?,
            monthly_loan_repayment: money_patch(
                "monthly_loan_repayment",
                &self.monthly_loan_repayment,
            )?,
            rent_amount: money_patch("rent_amount", &self.rent_amount)?,
            rent_frequency,
            yearly_expenses: money_patch("yearly_expenses", &self.yearly_expenses)?,
        })
    }
}

fn parse_text(field: &str, raw: &Value) -> Result<Option<String>, String> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) => Ok(clean_text(Some(s))),
        _ => Err(format!("{} must be a string", field)),
    }
}

fn text_patch(field: &str, raw: &Option<Value>) -> Result<Option<Option<String>>, String> {
    raw.as_ref().map(|value| parse_text(field, value)).transpose()
}

fn money_patch(field: &str, raw: &Option<Value>) -> Result<Option<Option<Decimal>>, String> {
    raw.as_ref().map(|value| parse_money(field, value)).transpose()
}

impl PropertyPatch {
    pub fn is_empty(&self) -> bool {
        *self == PropertyPatch::default()
    }

    /// Overwrite the supplied fields. Derived figures are not touched; they
    /// are recomputed on every read.
    pub fn apply_to(self, property: &mut Property) {
        if let Some(nickname) = self.nickname {
            property.nickname = nickname;
        }
        if let Some(address) = self.address {
            property.address = address;
        }
        if let Some(property_type) = self.property_type {
            property.property_type = property_type;
        }
        if let Some(suburb) = self.suburb {
            property.suburb = suburb;
        }
        if let Some(state) = self.state {
            property.state = state;
        }
        if let Some(postcode) = self.postcode {
            property.postcode = postcode;
        }
        if let Some(current_value) = self.current_value {
            property.current_value = current_value;
        }
        if let Some(outstanding_loan) = self.outstanding_loan {
            property.outstanding_loan = outstanding_loan;
        }
        if let Some(monthly_loan_repayment) = self.monthly_loan_repayment {
            property.monthly_loan_repayment = monthly_loan_repayment;
        }
        if let Some(rent_amount) = self.rent_amount {
            property.rent_amount = rent_amount;
        }
        if let Some(rent_frequency) = self.rent_frequency {
            property.rent_frequency = rent_frequency;
        }
        if let Some(yearly_expenses) = self.yearly_expenses {
            property.yearly_expenses = yearly_expenses;
        }
    }
}

/// Query parameters for GET /api/properties
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyListQuery {
    /// Case-insensitive match against address, nickname and suburb
    pub search: Option<String>,
    /// investment or ppor
    pub property_type: Option<String>,
    /// Case-insensitive suburb match
    pub suburb: Option<String>,
}

impl PropertyListQuery {
    pub fn validate(&self) -> Result<PropertyFilter, String> {
        let property_type = match clean_text(self.property_type.as_deref()) {
            Some(raw) => Some(parse_property_type(&raw)?),
            None => None,
        };
        Ok(PropertyFilter {
            search: clean_text(self.search.as_deref()).map(|s| s.to_lowercase()),
            property_type,
            suburb: clean_text(self.suburb.as_deref()).map(|s| s.to_lowercase()),
        })
    }
}

/// Listing filter shared by every store implementation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    /// Lowercased search term
    pub search: Option<String>,
    pub property_type: Option<PropertyType>,
    /// Lowercased suburb term
    pub suburb: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(property_type) = self.property_type {
            if property.property_type != property_type {
                return false;
            }
        }

        let contains = |field: Option<&str>, term: &str| {
            field.is_some_and(|value| value.to_lowercase().contains(term))
        };

        if let Some(suburb) = &self.suburb {
            if !contains(property.suburb.as_deref(), suburb.as_str()) {
                return false;
            }
        }

        if let Some(term) = &self.search {
            let term = term.as_str();
            let hit = contains(Some(property.address.as_str()), term)
                || contains(property.nickname.as_deref(), term)
                || contains(property.suburb.as_deref(), term);
            if !hit {
                return false;
            }
        }

        true
    }
}

/// Property with its derived figures, as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyResponse {
    pub id: String,
    pub url: Option<String>,
    pub address: String,
    pub nickname: Option<String>,
    pub property_type: PropertyType,
    pub dwelling_type: Option<String>,
    pub image_url: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub parking: Option<i32>,
    pub suburb: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub current_value: Option<f64>,
    pub previous_value: Option<f64>,
    pub outstanding_loan: Option<f64>,
    pub monthly_loan_repayment: Option<f64>,
    pub rent_amount: Option<f64>,
    pub rent_frequency: RentFrequency,
    pub yearly_expenses: Option<f64>,
    pub status: PropertyStatus,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub net_value: Option<f64>,
    pub daily_change: Option<f64>,
    pub daily_change_percent: Option<f64>,
    pub trend: Trend,
    /// Investment properties only
    pub annual_rental_income: Option<f64>,
    pub annual_loan_repayments: f64,
    /// Investment properties only
    pub yearly_cash_flow: Option<f64>,
    /// Investment properties only; magnitude of a negative cash flow
    pub yearly_shortage: Option<f64>,
    /// Investment properties only
    pub is_cash_flow_positive: Option<bool>,
}

impl PropertyResponse {
    pub fn new(property: &Property, metrics: &PropertyMetrics) -> Self {
        Self {
            id: property.id.clone(),
            url: property.url.clone(),
            address: property.address.clone(),
            nickname: property.nickname.clone(),
            property_type: property.property_type,
            dwelling_type: property.dwelling_type.clone(),
            image_url: property.image_url.clone(),
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            parking: property.parking,
            suburb: property.suburb.clone(),
            state: property.state.clone(),
            postcode: property.postcode.clone(),
            current_value: to_f64_opt(property.current_value),
            previous_value: to_f64_opt(property.previous_value),
            outstanding_loan: to_f64_opt(property.outstanding_loan),
            monthly_loan_repayment: to_f64_opt(property.monthly_loan_repayment),
            rent_amount: to_f64_opt(property.rent_amount),
            rent_frequency: property.rent_frequency,
            yearly_expenses: to_f64_opt(property.yearly_expenses),
            status: property.status,
            last_updated: property.last_updated,
            created_at: property.created_at,
            net_value: to_f64_opt(metrics.net_value),
            daily_change: to_f64_opt(metrics.daily_change.absolute),
            daily_change_percent: to_f64_opt(metrics.daily_change.percent),
            trend: metrics.daily_change.trend,
            annual_rental_income: to_f64_opt(metrics.annual_rental_income),
            annual_loan_repayments: to_f64(metrics.annual_loan_repayments),
            yearly_cash_flow: metrics.cash_flow.map(|c| to_f64(c.yearly_cash_flow)),
            yearly_shortage: metrics.cash_flow.map(|c| to_f64(c.yearly_shortage)),
            is_cash_flow_positive: metrics.cash_flow.map(|c| c.is_cash_flow_positive),
        }
    }
}
