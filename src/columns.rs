//! The metric column table shared by table views and preferences.
//!
//! Each column pairs a typed key with an accessor over [`ProtocolMetrics`],
//! a display formatter and the backing DuckDB column, so views iterate an
//! explicit list instead of looking fields up by string.

use serde::{Deserialize, Serialize};

use crate::format::{format_count, format_currency};
use crate::models::ProtocolMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    TotalVolume,
    DailyUsers,
    NewUsers,
    DailyTrades,
    TotalFees,
}

pub struct MetricColumn {
    pub key: MetricKey,
    pub label: &'static str,
    pub sql_column: &'static str,
    pub accessor: fn(&ProtocolMetrics) -> f64,
    pub formatter: fn(f64) -> String,
}

pub const METRIC_COLUMNS: &[MetricColumn] = &[
    MetricColumn {
        key: MetricKey::TotalVolume,
        label: "Volume",
        sql_column: "total_volume_usd",
        accessor: volume,
        formatter: format_currency,
    },
    MetricColumn {
        key: MetricKey::DailyUsers,
        label: "Daily Users",
        sql_column: "daily_users",
        accessor: daily_users,
        formatter: format_count,
    },
    MetricColumn {
        key: MetricKey::NewUsers,
        label: "New Users",
        sql_column: "new_users",
        accessor: new_users,
        formatter: format_count,
    },
    MetricColumn {
        key: MetricKey::DailyTrades,
        label: "Trades",
        sql_column: "daily_trades",
        accessor: daily_trades,
        formatter: format_count,
    },
    MetricColumn {
        key: MetricKey::TotalFees,
        label: "Fees",
        sql_column: "total_fees_usd",
        accessor: fees,
        formatter: format_currency,
    },
];

fn volume(m: &ProtocolMetrics) -> f64 {
    m.total_volume_usd
}

fn daily_users(m: &ProtocolMetrics) -> f64 {
    m.daily_users as f64
}

fn new_users(m: &ProtocolMetrics) -> f64 {
    m.new_users as f64
}

fn daily_trades(m: &ProtocolMetrics) -> f64 {
    m.daily_trades as f64
}

fn fees(m: &ProtocolMetrics) -> f64 {
    m.total_fees_usd
}

impl MetricKey {
    /// Every key in default display order.
    pub fn all() -> Vec<MetricKey> {
        METRIC_COLUMNS.iter().map(|c| c.key).collect()
    }

    pub fn column(&self) -> &'static MetricColumn {
        let index = match self {
            MetricKey::TotalVolume => 0,
            MetricKey::DailyUsers => 1,
            MetricKey::NewUsers => 2,
            MetricKey::DailyTrades => 3,
            MetricKey::TotalFees => 4,
        };
        &METRIC_COLUMNS[index]
    }

    pub fn sql_column(&self) -> &'static str {
        self.column().sql_column
    }

    pub fn label(&self) -> &'static str {
        self.column().label
    }

    pub fn value(&self, metrics: &ProtocolMetrics) -> f64 {
        (self.column().accessor)(metrics)
    }

    pub fn format(&self, value: f64) -> String {
        (self.column().formatter)(value)
    }
}

/// Render one row of cells for `metrics` in the given column order.
pub fn render_row(metrics: &ProtocolMetrics, order: &[MetricKey]) -> Vec<String> {
    order.iter().map(|k| k.format(k.value(metrics))).collect()
}
