//! Raw metric lookups: one day's snapshot, a protocol's history, and the
//! bulk optimized endpoint.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::columns::MetricKey;
use crate::connection::{Connection, METRICS_TABLE};
use crate::error::Result;
use crate::fetcher::MetricsFetcher;
use crate::models::{DailySnapshot, HistoryPoint, OptimizedMetrics, ProtocolId, ProtocolMetrics};
use crate::sql_builder::SqlBuilder;

#[derive(Deserialize)]
struct SnapshotRow {
    protocol: String,
    total_volume_usd: f64,
    daily_users: u64,
    new_users: u64,
    daily_trades: u64,
    total_fees_usd: f64,
}

/// Query interface over the loaded `daily_metrics` table.
pub struct MetricsQuery<'a> {
    conn: &'a Connection,
}

impl<'a> MetricsQuery<'a> {
    /// Create a new `MetricsQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All protocols reported for `date`. Empty when the backend has no data.
    pub fn daily(&self, date: NaiveDate) -> Result<DailySnapshot> {
        self.conn.ensure_dates(&[date])?;

        let mut cols = vec!["protocol"];
        cols.extend(MetricKey::all().iter().map(|k| k.sql_column()));
        let (sql, params) = SqlBuilder::new(METRICS_TABLE)
            .select(&cols)
            .where_date("date", date)
            .order_by(&["protocol ASC"])
            .build();

        let rows: Vec<SnapshotRow> = self.conn.execute_into(&sql, &params)?;
        let protocols = rows
            .into_iter()
            .map(|r| {
                (
                    ProtocolId::new(r.protocol),
                    ProtocolMetrics {
                        total_volume_usd: r.total_volume_usd,
                        daily_users: r.daily_users,
                        new_users: r.new_users,
                        daily_trades: r.daily_trades,
                        total_fees_usd: r.total_fees_usd,
                    },
                )
            })
            .collect();
        Ok(DailySnapshot { date, protocols })
    }

    /// Daily rows for one protocol over `from..=to`, oldest first.
    ///
    /// Days on which the protocol reported nothing are absent, not zero.
    pub fn history(&self, protocol: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<HistoryPoint>> {
        self.conn.ensure_range(from, to)?;

        let mut cols = vec!["CAST(date AS VARCHAR) AS date"];
        cols.extend(MetricKey::all().iter().map(|k| k.sql_column()));
        let (sql, params) = SqlBuilder::new(METRICS_TABLE)
            .select(&cols)
            .where_eq("protocol", protocol)
            .where_date_between("date", from, to)
            .order_by(&["date ASC"])
            .build();

        self.conn.execute_into(&sql, &params)
    }

    /// Bulk optimized metrics for `date`, straight from the cache layer.
    pub fn optimized(&self, date: NaiveDate) -> Result<BTreeMap<ProtocolId, OptimizedMetrics>> {
        self.conn.cache.borrow_mut().optimized_metrics(date)
    }
}
