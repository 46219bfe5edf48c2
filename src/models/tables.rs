use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RankedRow: One protocol's position in a ranked table view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub protocol: String,
    pub name: String,
    pub category: String,
    pub chain: String,
    pub value: f64,
    /// 1-based rank, ties share a rank.
    pub rank: i64,
    /// Percent rank in `[0, 1]`, 1 for the top value.
    pub percentile: f64,
    /// Fraction of the day's total for this metric.
    pub share: f64,
}

// ---------------------------------------------------------------------------
// MetricPercentiles: Distribution of one metric across protocols
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPercentiles {
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
    pub max: Option<f64>,
    pub count: i64,
}

// ---------------------------------------------------------------------------
// CategoryTotals: Per-category sums for one date
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub category: String,
    pub protocols: i64,
    pub total_volume_usd: f64,
    pub daily_users: f64,
    pub new_users: f64,
    pub daily_trades: f64,
    pub total_fees_usd: f64,
    pub market_share: f64,
}

// ---------------------------------------------------------------------------
// PeriodTotals / HistoryPoint: Time series rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub period_start: NaiveDate,
    pub days: i64,
    pub total_volume_usd: f64,
    pub daily_users: f64,
    pub new_users: f64,
    pub daily_trades: f64,
    pub total_fees_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub total_volume_usd: f64,
    pub daily_users: u64,
    pub new_users: u64,
    pub daily_trades: u64,
    pub total_fees_usd: f64,
}
