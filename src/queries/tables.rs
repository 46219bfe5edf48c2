//! Ranked and aggregated table views computed in DuckDB.

use chrono::NaiveDate;

use crate::columns::MetricKey;
use crate::connection::{Connection, METRICS_TABLE};
use crate::error::Result;
use crate::models::{CategoryTotals, MetricPercentiles, Period, PeriodTotals, RankedRow};
use crate::sql_builder::SqlBuilder;

/// Sum columns shared by the category and period roll-ups, all as DOUBLE.
const SUM_COLUMNS: &[&str] = &[
    "SUM(total_volume_usd) AS total_volume_usd",
    "CAST(SUM(daily_users) AS DOUBLE) AS daily_users",
    "CAST(SUM(new_users) AS DOUBLE) AS new_users",
    "CAST(SUM(daily_trades) AS DOUBLE) AS daily_trades",
    "SUM(total_fees_usd) AS total_fees_usd",
];

// ---------------------------------------------------------------------------
// TableQuery
// ---------------------------------------------------------------------------

/// Rank, percentile and roll-up views over `daily_metrics`.
pub struct TableQuery<'a> {
    conn: &'a Connection,
}

impl<'a> TableQuery<'a> {
    /// Create a new `TableQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Protocols ranked by `metric` on `date`, highest first.
    ///
    /// Protocols with a zero value are left out. Tied values share a rank;
    /// ties are listed by protocol id.
    pub fn ranked(&self, date: NaiveDate, metric: MetricKey) -> Result<Vec<RankedRow>> {
        self.conn.ensure_dates(&[date])?;

        let col = metric.sql_column();
        let value = format!("CAST({} AS DOUBLE)", col);
        let cols = [
            "protocol".to_string(),
            "name".to_string(),
            "category".to_string(),
            "chain".to_string(),
            format!("{} AS value", value),
            format!("RANK() OVER (ORDER BY {} DESC) AS rank", col),
            format!("1 - PERCENT_RANK() OVER (ORDER BY {} DESC) AS percentile", col),
            format!("{v} / SUM({v}) OVER () AS share", v = value),
        ];
        let cols: Vec<&str> = cols.iter().map(String::as_str).collect();

        let (sql, params) = SqlBuilder::new(METRICS_TABLE)
            .select(&cols)
            .where_date("date", date)
            .where_positive(col)
            .order_by(&["rank ASC", "protocol ASC"])
            .build();

        self.conn.execute_into(&sql, &params)
    }

    /// Distribution of `metric` across the protocols active on `date`.
    pub fn percentiles(&self, date: NaiveDate, metric: MetricKey) -> Result<MetricPercentiles> {
        self.conn.ensure_dates(&[date])?;

        let value = format!("CAST({} AS DOUBLE)", metric.sql_column());
        let cols = [
            format!("quantile_cont({}, 0.25) AS p25", value),
            format!("quantile_cont({}, 0.50) AS p50", value),
            format!("quantile_cont({}, 0.75) AS p75", value),
            format!("quantile_cont({}, 0.90) AS p90", value),
            format!("MAX({}) AS max", value),
            "COUNT(*) AS count".to_string(),
        ];
        let cols: Vec<&str> = cols.iter().map(String::as_str).collect();

        let (sql, params) = SqlBuilder::new(METRICS_TABLE)
            .select(&cols)
            .where_date("date", date)
            .where_positive(metric.sql_column())
            .build();

        let mut rows: Vec<MetricPercentiles> = self.conn.execute_into(&sql, &params)?;
        Ok(rows.pop().unwrap_or(MetricPercentiles {
            p25: None,
            p50: None,
            p75: None,
            p90: None,
            max: None,
            count: 0,
        }))
    }

    /// Per-category sums for `date`, largest volume first.
    pub fn category_totals(&self, date: NaiveDate) -> Result<Vec<CategoryTotals>> {
        self.conn.ensure_dates(&[date])?;

        let mut cols = vec!["category", "COUNT(*) AS protocols"];
        cols.extend_from_slice(SUM_COLUMNS);
        cols.push(
            "COALESCE(SUM(total_volume_usd) / NULLIF(SUM(SUM(total_volume_usd)) OVER (), 0), 0) AS market_share",
        );

        let (sql, params) = SqlBuilder::new(METRICS_TABLE)
            .select(&cols)
            .where_date("date", date)
            .group_by(&["category"])
            .order_by(&["SUM(total_volume_usd) DESC", "category ASC"])
            .build();

        self.conn.execute_into(&sql, &params)
    }

    /// One protocol's totals over `from..=to`, bucketed by `period`.
    ///
    /// `days` counts the days in each bucket on which the protocol reported.
    pub fn period_totals(
        &self,
        protocol: &str,
        from: NaiveDate,
        to: NaiveDate,
        period: Period,
    ) -> Result<Vec<PeriodTotals>> {
        self.conn.ensure_range(from, to)?;

        let bucket = format!("CAST(date_trunc('{}', date) AS DATE)", period.as_sql());
        let start = format!("CAST({} AS VARCHAR) AS period_start", bucket);
        let mut cols = vec![start.as_str(), "COUNT(*) AS days"];
        cols.extend_from_slice(SUM_COLUMNS);

        let (sql, params) = SqlBuilder::new(METRICS_TABLE)
            .select(&cols)
            .where_eq("protocol", protocol)
            .where_date_between("date", from, to)
            .group_by(&[bucket.as_str()])
            .order_by(&["period_start ASC"])
            .build();

        self.conn.execute_into(&sql, &params)
    }
}
