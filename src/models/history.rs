use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{clean_text, to_f64, to_f64_opt};

pub const DEFAULT_HISTORY_DAYS: i64 = 30;
pub const MAX_HISTORY_DAYS: i64 = 3650;

/// One recorded snapshot of a property's value
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub property_id: String,
    pub recorded_at: DateTime<Utc>,
    pub value: Decimal,
    pub loan: Option<Decimal>,
    pub net_value: Option<Decimal>,
}

impl HistoryEntry {
    pub fn new(
        property_id: &str,
        recorded_at: DateTime<Utc>,
        value: Decimal,
        loan: Option<Decimal>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            property_id: property_id.to_string(),
            recorded_at,
            value,
            loan,
            net_value: Some(value - loan.unwrap_or_default()),
        }
    }
}

/// Query parameters for GET /api/properties/{id}/history
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Window size in days (default 30)
    pub days: Option<i64>,
}

impl HistoryQuery {
    pub fn validate(&self) -> Result<i64, String> {
        validate_days(self.days)
    }
}

fn validate_days(days: Option<i64>) -> Result<i64, String> {
    let days = days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if !(1..=MAX_HISTORY_DAYS).contains(&days) {
        return Err(format!(
            "days must be between 1 and {}",
            MAX_HISTORY_DAYS
        ));
    }
    Ok(days)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntryResponse {
    pub id: String,
    pub property_id: String,
    pub recorded_at: DateTime<Utc>,
    pub value: f64,
    pub loan: Option<f64>,
    pub net_value: Option<f64>,
}

impl From<&HistoryEntry> for HistoryEntryResponse {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            property_id: entry.property_id.clone(),
            recorded_at: entry.recorded_at,
            value: to_f64(entry.value),
            loan: to_f64_opt(entry.loan),
            net_value: to_f64_opt(entry.net_value),
        }
    }
}

/// Which properties contribute to the portfolio trend series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryScope {
    #[default]
    All,
    /// PPOR excluded
    Investment,
}

impl HistoryScope {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(HistoryScope::All),
            "investment" => Some(HistoryScope::Investment),
            _ => None,
        }
    }
}

/// Query parameters for GET /api/portfolio/history
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioHistoryQuery {
    pub days: Option<i64>,
    /// all (default) or investment
    pub scope: Option<String>,
}

impl PortfolioHistoryQuery {
    pub fn validate(&self) -> Result<(i64, HistoryScope), String> {
        let days = validate_days(self.days)?;
        let scope = match clean_text(self.scope.as_deref()) {
            Some(raw) => HistoryScope::from_str(&raw).ok_or_else(|| {
                format!("Invalid scope: '{}'. Must be one of: all, investment", raw)
            })?,
            None => HistoryScope::All,
        };
        Ok((days, scope))
    }
}

/// Portfolio totals for one calendar date
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioHistoryPoint {
    pub date: NaiveDate,
    pub total_value: Decimal,
    pub total_loan: Decimal,
    pub total_net: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioHistoryPointResponse {
    pub date: NaiveDate,
    pub total_value: f64,
    pub total_loan: f64,
    pub total_net: f64,
}

impl From<&PortfolioHistoryPoint> for PortfolioHistoryPointResponse {
    fn from(point: &PortfolioHistoryPoint) -> Self {
        Self {
            date: point.date,
            total_value: to_f64(point.total_value),
            total_loan: to_f64(point.total_loan),
            total_net: to_f64(point.total_net),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioHistoryResponse {
    pub data: Vec<PortfolioHistoryPointResponse>,
    pub days: i64,
    pub scope: HistoryScope,
    /// False when no property has an entry inside the window
    pub has_data: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_days_defaults_and_bounds() {
        assert_eq!(HistoryQuery { days: None }.validate().unwrap(), 30);
        assert_eq!(HistoryQuery { days: Some(7) }.validate().unwrap(), 7);
        assert_eq!(HistoryQuery { days: Some(3650) }.validate().unwrap(), 3650);
        assert!(HistoryQuery { days: Some(0) }.validate().is_err());
        assert!(HistoryQuery { days: Some(-3) }.validate().is_err());
        assert!(HistoryQuery { days: Some(3651) }.validate().is_err());
    }

    #[test]
    fn test_portfolio_query_scope() {
        let query = PortfolioHistoryQuery {
            days: Some(90),
            scope: Some("Investment".to_string()),
        };
        assert_eq!(query.validate().unwrap(), (90, HistoryScope::Investment));

        let query = PortfolioHistoryQuery::default();
        assert_eq!(query.validate().unwrap(), (30, HistoryScope::All));

        let query = PortfolioHistoryQuery {
            days: None,
            scope: Some("ppor".to_string()),
        };
        assert!(query.validate().unwrap_err().contains("Invalid scope"));
    }

    #[test]
    fn test_entry_net_value() {
        let entry = HistoryEntry::new("p1", Utc::now(), dec!(714000), Some(dec!(500000)));
        assert_eq!(entry.net_value, Some(dec!(214000)));

        let entry = HistoryEntry::new("p1", Utc::now(), dec!(714000), None);
        assert_eq!(entry.net_value, Some(dec!(714000)));
    }
}
