use serde::{Deserialize, Serialize};

use super::common::to_f64;
use crate::services::metrics::PortfolioStats;

/// Response for GET /api/portfolio/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioStatsResponse {
    pub total_properties: usize,
    pub investment_count: usize,
    pub ppor_count: usize,
    pub active: usize,
    pub pending: usize,
    pub error: usize,
    pub total_property_value: f64,
    pub total_outstanding_loans: f64,
    pub total_net_value: f64,
    pub total_annual_rental_income: f64,
    pub total_annual_loan_repayments: f64,
    pub total_annual_expenses: f64,
    /// Positive means the investment properties run a net shortage
    pub overall_yearly_shortage: f64,
    pub is_cash_flow_positive: bool,
    pub average_daily_change: f64,
}

impl From<&PortfolioStats> for PortfolioStatsResponse {
    fn from(stats: &PortfolioStats) -> Self {
        Self {
            total_properties: stats.total_properties,
            investment_count: stats.investment_count,
            ppor_count: stats.ppor_count,
            active: stats.active,
            pending: stats.pending,
            error: stats.error,
            total_property_value: to_f64(stats.total_property_value),
            total_outstanding_loans: to_f64(stats.total_outstanding_loans),
            total_net_value: to_f64(stats.total_net_value),
            total_annual_rental_income: to_f64(stats.total_annual_rental_income),
            total_annual_loan_repayments: to_f64(stats.total_annual_loan_repayments),
            total_annual_expenses: to_f64(stats.total_annual_expenses),
            overall_yearly_shortage: to_f64(stats.overall_yearly_shortage),
            is_cash_flow_positive: stats.is_cash_flow_positive,
            average_daily_change: to_f64(stats.average_daily_change),
        }
    }
}
