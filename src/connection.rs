//! DuckDB connection wrapper holding fetched snapshots as a queryable table.
//!
//! Every date a query touches is fetched through the [`CacheManager`] on first
//! use and inserted into the in-memory `daily_metrics` table, tagged with the
//! protocol's catalog name, category and chain.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use chrono::{Days, NaiveDate, Utc};
use duckdb::{params, types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::CacheManager;
use crate::config;
use crate::error::{AnalyticsError, Result};
use crate::fetcher::MetricsFetcher;
use crate::models::{DailySnapshot, ProtocolCatalog};

pub const METRICS_TABLE: &str = "daily_metrics";

const CREATE_METRICS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS daily_metrics (
        date DATE NOT NULL,
        protocol VARCHAR NOT NULL,
        name VARCHAR NOT NULL,
        category VARCHAR NOT NULL,
        chain VARCHAR NOT NULL,
        total_volume_usd DOUBLE NOT NULL,
        daily_users BIGINT NOT NULL,
        new_users BIGINT NOT NULL,
        daily_trades BIGINT NOT NULL,
        total_fees_usd DOUBLE NOT NULL
    )";

/// Wraps a DuckDB connection and loads fetched snapshots into `daily_metrics`.
pub struct Connection {
    conn: DuckDbConnection,
    /// The cache manager used to fetch/locate snapshots.
    pub cache: RefCell<CacheManager>,
    catalog: ProtocolCatalog,
    loaded_dates: RefCell<BTreeSet<NaiveDate>>,
}

impl Connection {
    /// Create a connection backed by the given cache.
    ///
    /// Opens an in-memory DuckDB database and creates the metrics table.
    pub fn new(cache: CacheManager, catalog: ProtocolCatalog) -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        conn.execute_batch(CREATE_METRICS_TABLE)?;
        Ok(Self {
            conn,
            cache: RefCell::new(cache),
            catalog,
            loaded_dates: RefCell::new(BTreeSet::new()),
        })
    }

    pub fn catalog(&self) -> &ProtocolCatalog {
        &self.catalog
    }

    /// Ensure each date is loaded, fetching snapshots if needed.
    ///
    /// Dates that are not yet settled are reloaded on every call unless the
    /// cache is offline, so table views track the same data as the insights.
    pub fn ensure_dates(&self, dates: &[NaiveDate]) -> Result<()> {
        let today = Utc::now().date_naive();
        for date in dates {
            if self.needs_load(*date, today) {
                let snapshot = self.cache.borrow_mut().daily_metrics(*date)?;
                self.load_snapshot(&snapshot)?;
            }
        }
        Ok(())
    }

    fn needs_load(&self, date: NaiveDate, today: NaiveDate) -> bool {
        if !self.loaded_dates.borrow().contains(&date) {
            return true;
        }
        !self.cache.borrow().offline && !config::is_settled(date, today)
    }

    /// Ensure every date in `from..=to` is loaded.
    pub fn ensure_range(&self, from: NaiveDate, to: NaiveDate) -> Result<()> {
        if from > to {
            return Err(AnalyticsError::InvalidArgument(format!(
                "empty date range {}..={}",
                from, to
            )));
        }
        let days = (to - from).num_days() as u64;
        let dates: Vec<NaiveDate> = (0..=days)
            .filter_map(|offset| from.checked_add_days(Days::new(offset)))
            .collect();
        self.ensure_dates(&dates)
    }

    /// Insert (or replace) one date's rows in `daily_metrics`.
    ///
    /// Returns the number of protocol rows written.
    pub fn load_snapshot(&self, snapshot: &DailySnapshot) -> Result<usize> {
        let date = snapshot.date.format("%Y-%m-%d").to_string();

        self.conn.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize> {
            self.conn.execute(
                "DELETE FROM daily_metrics WHERE date = CAST(? AS DATE)",
                params![date],
            )?;
            let mut stmt = self.conn.prepare(
                "INSERT INTO daily_metrics VALUES (CAST(? AS DATE), ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for (id, m) in &snapshot.protocols {
                stmt.execute(params![
                    date,
                    id.as_str(),
                    self.catalog.name(id),
                    self.catalog.category(id),
                    self.catalog.chain(id).as_str(),
                    m.total_volume_usd,
                    m.daily_users as i64,
                    m.new_users as i64,
                    m.daily_trades as i64,
                    m.total_fees_usd,
                ])?;
            }
            Ok(snapshot.protocols.len())
        })();

        match result {
            Ok(rows) => {
                self.conn.execute_batch("COMMIT")?;
                self.loaded_dates.borrow_mut().insert(snapshot.date);
                debug!(date = %snapshot.date, rows, "loaded snapshot");
                Ok(rows)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    /// Automatically converts DuckDB types to `serde_json::Value`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the query has run
        let statement = rows_result.as_ref().ok_or_else(|| {
            AnalyticsError::InvalidArgument("query returned no statement".to_string())
        })?;
        let column_names: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, col_name) in column_names.iter().enumerate() {
                map.insert(col_name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Check whether a date has been loaded.
    pub fn has_date(&self, date: NaiveDate) -> bool {
        self.loaded_dates.borrow().contains(&date)
    }

    /// Loaded dates, ascending.
    pub fn loaded_dates(&self) -> Vec<NaiveDate> {
        self.loaded_dates.borrow().iter().copied().collect()
    }

    /// Drop all loaded rows so dates are re-fetched on next access.
    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch("DELETE FROM daily_metrics")?;
        self.loaded_dates.borrow_mut().clear();
        Ok(())
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

/// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // SUM over BIGINT yields HUGEINT; fall back to a string past i64
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
        }
        ValueRef::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|d| serde_json::Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(serde_json::Value::Null),
        _ => serde_json::Value::Null,
    }
}
