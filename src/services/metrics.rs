//! Metrics engine
//!
//! Pure functions deriving per-property and portfolio financial figures
//! from stored state. No I/O, no hidden state: the same properties always
//! yield the same numbers. Inputs are assumed validated (numeric or None);
//! missing amounts fall back to documented defaults instead of erroring.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::property::{Property, PropertyStatus, RentFrequency};

/// Direction of the latest value change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    fn of(change: Option<Decimal>) -> Self {
        match change {
            Some(c) if c > Decimal::ZERO => Trend::Up,
            Some(c) if c < Decimal::ZERO => Trend::Down,
            _ => Trend::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyChange {
    pub absolute: Option<Decimal>,
    /// Percent of the previous value, 2 decimal places
    pub percent: Option<Decimal>,
    pub trend: Trend,
}

impl DailyChange {
    fn none() -> Self {
        Self {
            absolute: None,
            percent: None,
            trend: Trend::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    /// rental income - (loan repayments + expenses)
    pub yearly_cash_flow: Decimal,
    /// Magnitude of a negative cash flow, 0 otherwise
    pub yearly_shortage: Decimal,
    pub is_cash_flow_positive: bool,
}

/// Everything derived from a single property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMetrics {
    pub net_value: Option<Decimal>,
    pub daily_change: DailyChange,
    /// Investment properties only
    pub annual_rental_income: Option<Decimal>,
    pub annual_loan_repayments: Decimal,
    /// Investment properties only
    pub cash_flow: Option<CashFlow>,
}

/// Portfolio-wide aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioStats {
    pub total_properties: usize,
    pub investment_count: usize,
    pub ppor_count: usize,
    pub active: usize,
    pub pending: usize,
    pub error: usize,
    pub total_property_value: Decimal,
    pub total_outstanding_loans: Decimal,
    pub total_net_value: Decimal,
    pub total_annual_rental_income: Decimal,
    pub total_annual_loan_repayments: Decimal,
    pub total_annual_expenses: Decimal,
    /// Signed: positive means the investment subset runs a net shortage
    pub overall_yearly_shortage: Decimal,
    pub is_cash_flow_positive: bool,
    /// Mean of the known daily change percents
    pub average_daily_change: Decimal,
}

/// Equity. None when the current value is unknown; a missing loan counts as 0.
pub fn compute_net_value(
    current_value: Option<Decimal>,
    outstanding_loan: Option<Decimal>,
) -> Option<Decimal> {
    current_value.map(|value| value - outstanding_loan.unwrap_or_default())
}

/// Change between the previous and the current recorded value.
///
/// A missing current value, or a previous value that is missing or zero,
/// yields "no change" (both None, neutral trend).
pub fn compute_daily_change(
    current_value: Option<Decimal>,
    previous_value: Option<Decimal>,
) -> DailyChange {
    let (Some(current), Some(previous)) = (current_value, previous_value) else {
        return DailyChange::none();
    };
    if previous.is_zero() {
        return DailyChange::none();
    }

    let absolute = current - previous;
    let percent = round_2dp(absolute / previous * Decimal::ONE_HUNDRED);

    DailyChange {
        absolute: Some(absolute),
        percent: Some(percent),
        trend: Trend::of(Some(absolute)),
    }
}

pub fn annualize_rent(rent_amount: Option<Decimal>, rent_frequency: RentFrequency) -> Decimal {
    let periods = match rent_frequency {
        RentFrequency::Weekly => Decimal::from(52),
        RentFrequency::Monthly => Decimal::from(12),
    };
    rent_amount.unwrap_or_default() * periods
}

pub fn annualize_loan_repayment(monthly_loan_repayment: Option<Decimal>) -> Decimal {
    monthly_loan_repayment.unwrap_or_default() * Decimal::from(12)
}

pub fn compute_yearly_cash_flow(
    annual_rental_income: Decimal,
    annual_loan_repayments: Decimal,
    yearly_expenses: Decimal,
) -> CashFlow {
    let yearly_cash_flow = annual_rental_income - (annual_loan_repayments + yearly_expenses);
    CashFlow {
        yearly_cash_flow,
        yearly_shortage: (-yearly_cash_flow).max(Decimal::ZERO),
        is_cash_flow_positive: yearly_cash_flow >= Decimal::ZERO,
    }
}

/// Derive every per-property figure. Cash-flow figures only apply to
/// investment properties.
pub fn derive_property_metrics(property: &Property) -> PropertyMetrics {
    let annual_loan_repayments = annualize_loan_repayment(property.monthly_loan_repayment);

    let (annual_rental_income, cash_flow) = if property.is_investment() {
        let rental = annualize_rent(property.rent_amount, property.rent_frequency);
        let cash_flow = compute_yearly_cash_flow(
            rental,
            annual_loan_repayments,
            property.yearly_expenses.unwrap_or_default(),
        );
        (Some(rental), Some(cash_flow))
    } else {
        (None, None)
    };

    PropertyMetrics {
        net_value: compute_net_value(property.current_value, property.outstanding_loan),
        daily_change: compute_daily_change(property.current_value, property.previous_value),
        annual_rental_income,
        annual_loan_repayments,
        cash_flow,
    }
}

/// Aggregate the whole portfolio.
///
/// Value, loan and net totals cover every property (unknown amounts count
/// as 0). Rental, repayment, expense and shortage totals cover investment
/// properties only.
pub fn aggregate_portfolio_stats(properties: &[Property]) -> PortfolioStats {
    let mut stats = PortfolioStats {
        total_properties: properties.len(),
        investment_count: 0,
        ppor_count: 0,
        active: 0,
        pending: 0,
        error: 0,
        total_property_value: Decimal::ZERO,
        total_outstanding_loans: Decimal::ZERO,
        total_net_value: Decimal::ZERO,
        total_annual_rental_income: Decimal::ZERO,
        total_annual_loan_repayments: Decimal::ZERO,
        total_annual_expenses: Decimal::ZERO,
        overall_yearly_shortage: Decimal::ZERO,
        is_cash_flow_positive: true,
        average_daily_change: Decimal::ZERO,
    };

    let mut change_sum = Decimal::ZERO;
    let mut change_count = 0u32;

    for property in properties {
        match property.status {
            PropertyStatus::Active => stats.active += 1,
            PropertyStatus::Pending => stats.pending += 1,
            PropertyStatus::Error => stats.error += 1,
        }

        stats.total_property_value += property.current_value.unwrap_or_default();
        stats.total_outstanding_loans += property.outstanding_loan.unwrap_or_default();

        if let Some(percent) =
            compute_daily_change(property.current_value, property.previous_value).percent
        {
            change_sum += percent;
            change_count += 1;
        }

        if property.is_investment() {
            stats.investment_count += 1;
            stats.total_annual_rental_income +=
                annualize_rent(property.rent_amount, property.rent_frequency);
            stats.total_annual_loan_repayments +=
                annualize_loan_repayment(property.monthly_loan_repayment);
            stats.total_annual_expenses += property.yearly_expenses.unwrap_or_default();
        } else {
            stats.ppor_count += 1;
        }
    }

    stats.total_net_value = stats.total_property_value - stats.total_outstanding_loans;
    stats.overall_yearly_shortage = stats.total_annual_loan_repayments
        + stats.total_annual_expenses
        - stats.total_annual_rental_income;
    stats.is_cash_flow_positive = stats.overall_yearly_shortage <= Decimal::ZERO;

    if change_count > 0 {
        stats.average_daily_change = round_2dp(change_sum / Decimal::from(change_count));
    }

    stats
}

fn round_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::PropertyType;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn investment() -> Property {
        let mut property = Property::new(
            "78 James Street, Fortitude Valley QLD 4006".to_string(),
            PropertyType::Investment,
            Utc::now(),
        );
        property.current_value = Some(dec!(750000));
        property.outstanding_loan = Some(dec!(500000));
        property.rent_amount = Some(dec!(2500));
        property.rent_frequency = RentFrequency::Monthly;
        property.yearly_expenses = Some(dec!(8000));
        property.monthly_loan_repayment = Some(dec!(3000));
        property
    }

    fn ppor() -> Property {
        let mut property = Property::new(
            "9 Home Street, Newtown NSW 2042".to_string(),
            PropertyType::Ppor,
            Utc::now(),
        );
        property.current_value = Some(dec!(1200000));
        property.outstanding_loan = Some(dec!(600000));
        property.monthly_loan_repayment = Some(dec!(4000));
        property.rent_amount = Some(dec!(999));
        property.yearly_expenses = Some(dec!(5000));
        property
    }

    #[test]
    fn test_net_value() {
        assert_eq!(
            compute_net_value(Some(dec!(750000)), Some(dec!(500000))),
            Some(dec!(250000))
        );
        assert_eq!(compute_net_value(Some(dec!(750000)), None), Some(dec!(750000)));
        assert_eq!(compute_net_value(None, Some(dec!(500000))), None);
    }

    #[test]
    fn test_daily_change() {
        let change = compute_daily_change(Some(dec!(714000)), Some(dec!(700000)));
        assert_eq!(change.absolute, Some(dec!(14000)));
        assert_eq!(change.percent, Some(dec!(2.0)));
        assert_eq!(change.trend, Trend::Up);

        let change = compute_daily_change(Some(dec!(980000)), Some(dec!(985000)));
        assert_eq!(change.absolute, Some(dec!(-5000)));
        assert_eq!(change.percent, Some(dec!(-0.51)));
        assert_eq!(change.trend, Trend::Down);
    }

    #[test]
    fn test_daily_change_guards() {
        assert_eq!(
            compute_daily_change(Some(dec!(500000)), Some(Decimal::ZERO)),
            DailyChange::none()
        );
        assert_eq!(compute_daily_change(Some(dec!(500000)), None), DailyChange::none());
        assert_eq!(compute_daily_change(None, Some(dec!(500000))), DailyChange::none());

        let flat = compute_daily_change(Some(dec!(500000)), Some(dec!(500000)));
        assert_eq!(flat.absolute, Some(Decimal::ZERO));
        assert_eq!(flat.trend, Trend::Neutral);
    }

    #[test]
    fn test_annualize() {
        assert_eq!(annualize_rent(Some(dec!(500)), RentFrequency::Weekly), dec!(26000));
        assert_eq!(annualize_rent(Some(dec!(2500)), RentFrequency::Monthly), dec!(30000));
        assert_eq!(annualize_rent(None, RentFrequency::Weekly), Decimal::ZERO);
        assert_eq!(annualize_loan_repayment(Some(dec!(3000))), dec!(36000));
        assert_eq!(annualize_loan_repayment(None), Decimal::ZERO);
    }

    #[test]
    fn test_cash_flow_sign() {
        let deficit = compute_yearly_cash_flow(dec!(30000), dec!(36000), dec!(8000));
        assert_eq!(deficit.yearly_cash_flow, dec!(-14000));
        assert_eq!(deficit.yearly_shortage, dec!(14000));
        assert!(!deficit.is_cash_flow_positive);

        let surplus = compute_yearly_cash_flow(dec!(40000), dec!(30000), dec!(5000));
        assert_eq!(surplus.yearly_cash_flow, dec!(5000));
        assert_eq!(surplus.yearly_shortage, Decimal::ZERO);
        assert!(surplus.is_cash_flow_positive);

        let break_even = compute_yearly_cash_flow(dec!(30000), dec!(30000), Decimal::ZERO);
        assert!(break_even.is_cash_flow_positive);
        assert_eq!(break_even.yearly_shortage, Decimal::ZERO);
    }

    #[test]
    fn test_derive_investment_metrics() {
        let metrics = derive_property_metrics(&investment());

        assert_eq!(metrics.net_value, Some(dec!(250000)));
        assert_eq!(metrics.annual_rental_income, Some(dec!(30000)));
        assert_eq!(metrics.annual_loan_repayments, dec!(36000));

        let cash_flow = metrics.cash_flow.unwrap();
        assert_eq!(cash_flow.yearly_shortage, dec!(14000));
        assert!(!cash_flow.is_cash_flow_positive);
    }

    #[test]
    fn test_derive_ppor_metrics_skip_cash_flow() {
        let metrics = derive_property_metrics(&ppor());

        assert_eq!(metrics.net_value, Some(dec!(600000)));
        assert_eq!(metrics.annual_rental_income, None);
        assert_eq!(metrics.cash_flow, None);
        assert_eq!(metrics.annual_loan_repayments, dec!(48000));
    }

    #[test]
    fn test_portfolio_stats_segregates_ppor() {
        let stats = aggregate_portfolio_stats(&[investment(), ppor()]);

        assert_eq!(stats.total_properties, 2);
        assert_eq!(stats.investment_count, 1);
        assert_eq!(stats.ppor_count, 1);
        assert_eq!(stats.total_property_value, dec!(1950000));
        assert_eq!(stats.total_outstanding_loans, dec!(1100000));
        assert_eq!(stats.total_net_value, dec!(850000));

        // PPOR rent, repayments and expenses are ignored
        assert_eq!(stats.total_annual_rental_income, dec!(30000));
        assert_eq!(stats.total_annual_loan_repayments, dec!(36000));
        assert_eq!(stats.total_annual_expenses, dec!(8000));
        assert_eq!(stats.overall_yearly_shortage, dec!(14000));
        assert!(!stats.is_cash_flow_positive);
    }

    #[test]
    fn test_portfolio_stats_null_values_count_as_zero() {
        let mut unknown = investment();
        unknown.current_value = None;
        unknown.outstanding_loan = None;
        unknown.rent_amount = None;
        unknown.monthly_loan_repayment = None;
        unknown.yearly_expenses = None;
        unknown.status = PropertyStatus::Pending;

        let stats = aggregate_portfolio_stats(&[unknown]);
        assert_eq!(stats.total_property_value, Decimal::ZERO);
        assert_eq!(stats.total_net_value, Decimal::ZERO);
        assert_eq!(stats.overall_yearly_shortage, Decimal::ZERO);
        assert!(stats.is_cash_flow_positive);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.average_daily_change, Decimal::ZERO);
    }

    #[test]
    fn test_portfolio_stats_order_independent() {
        let mut a = investment();
        a.previous_value = Some(dec!(740000));
        let mut b = ppor();
        b.previous_value = Some(dec!(1210000));
        let mut c = investment();
        c.rent_amount = Some(dec!(650.55));
        c.rent_frequency = RentFrequency::Weekly;
        c.status = PropertyStatus::Error;

        let forward = aggregate_portfolio_stats(&[a.clone(), b.clone(), c.clone()]);
        let reversed = aggregate_portfolio_stats(&[c.clone(), b.clone(), a.clone()]);
        let shuffled = aggregate_portfolio_stats(&[b, a, c]);

        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_average_daily_change() {
        let mut up = investment();
        up.previous_value = Some(dec!(700000));
        up.current_value = Some(dec!(714000));
        let mut down = ppor();
        down.previous_value = Some(dec!(1000000));
        down.current_value = Some(dec!(990000));
        let no_history = investment();

        let stats = aggregate_portfolio_stats(&[up, down, no_history]);
        // (2.00 + -1.00) / 2
        assert_eq!(stats.average_daily_change, dec!(0.5));
    }

    #[test]
    fn test_empty_portfolio() {
        let stats = aggregate_portfolio_stats(&[]);
        assert_eq!(stats.total_properties, 0);
        assert_eq!(stats.total_net_value, Decimal::ZERO);
        assert!(stats.is_cash_flow_positive);
    }
}
