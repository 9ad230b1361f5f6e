//! Shared request/response helpers
//!
//! Monetary input arrives duck-typed (JSON number, numeric string, empty
//! string or null). Everything is normalized here into `Option<Decimal>`
//! before it reaches the lifecycle manager or the metrics engine.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Generic error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Simple `{"message": ...}` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Largest amount a `decimal(16,2)` money column holds
pub const MAX_MONEY: Decimal = dec!(99999999999999.99);

/// Round to cents the way Postgres numeric columns do
pub fn round_money(amount: Decimal) -> Decimal {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

pub fn money_in_range(amount: Decimal) -> bool {
    amount >= Decimal::ZERO && amount <= MAX_MONEY
}

/// Parse a monetary field.
///
/// - `null` or an empty/blank string means "not provided" (`Ok(None)`)
/// - JSON numbers and numeric strings are accepted and rounded to cents
/// - anything else, a negative amount or one above `MAX_MONEY` is rejected
pub fn parse_money(field: &str, raw: &Value) -> Result<Option<Decimal>, String> {
    let amount = match raw {
        Value::Null => return Ok(None),
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            parse_decimal(trimmed)
        }
        _ => None,
    }
    .ok_or_else(|| format!("{} must be a number", field))?;

    if amount < Decimal::ZERO {
        return Err(format!("{} must not be negative", field));
    }

    let amount = round_money(amount);
    if amount > MAX_MONEY {
        return Err(format!("{} must not exceed {}", field, MAX_MONEY));
    }

    Ok(Some(amount))
}

/// Parse an optional monetary field that may be missing from the payload.
pub fn parse_optional_money(field: &str, raw: Option<&Value>) -> Result<Option<Decimal>, String> {
    match raw {
        Some(value) => parse_money(field, value),
        None => Ok(None),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Deserialize a field so that an explicit `null` is distinguishable from an
/// absent key. Use together with `#[serde(default)]`.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Trim a free-text field; blank strings become `None`.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Wire representation of money: plain JSON numbers
pub fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

pub fn to_f64_opt(amount: Option<Decimal>) -> Option<f64> {
    amount.map(to_f64)
}
