//! History aggregation
//!
//! Windowed per-property series and the portfolio-level trend series.
//! Dates are UTC calendar days. A property only contributes to a date on
//! which it actually has an entry; gaps are never filled in.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::models::history::{HistoryEntry, PortfolioHistoryPoint};

/// Entries recorded within the last `days` days, oldest first.
pub fn filter_by_window(
    entries: &[HistoryEntry],
    days: i64,
    now: DateTime<Utc>,
) -> Vec<HistoryEntry> {
    let cutoff = now - Duration::days(days);

    let mut windowed: Vec<HistoryEntry> = entries
        .iter()
        .filter(|entry| entry.recorded_at >= cutoff)
        .cloned()
        .collect();
    windowed.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
    windowed
}

/// Sum the windowed entries of every property per calendar date.
///
/// When a property has several entries on the same date, the latest one
/// stands for that property.
pub fn build_portfolio_history(
    entries: &[HistoryEntry],
    days: i64,
    now: DateTime<Utc>,
) -> Vec<PortfolioHistoryPoint> {
    let windowed = filter_by_window(entries, days, now);

    // date -> property_id -> latest entry of that day
    let mut by_date: BTreeMap<NaiveDate, HashMap<&str, &HistoryEntry>> = BTreeMap::new();
    for entry in &windowed {
        let day = by_date.entry(entry.recorded_at.date_naive()).or_default();
        match day.get(entry.property_id.as_str()) {
            Some(existing) if existing.recorded_at > entry.recorded_at => {}
            _ => {
                day.insert(entry.property_id.as_str(), entry);
            }
        }
    }

    by_date
        .into_iter()
        .map(|(date, day)| {
            let mut point = PortfolioHistoryPoint {
                date,
                total_value: Decimal::ZERO,
                total_loan: Decimal::ZERO,
                total_net: Decimal::ZERO,
            };
            for entry in day.values() {
                let loan = entry.loan.unwrap_or_default();
                point.total_value += entry.value;
                point.total_loan += loan;
                point.total_net += entry.net_value.unwrap_or(entry.value - loan);
            }
            point
        })
        .collect()
}
