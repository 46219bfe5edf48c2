//! Solana trading-bot analytics SDK for Rust.
//!
//! Fetches per-protocol daily metrics (volume, users, new users, trades,
//! fees) from the analytics backend, caches them locally, derives trend
//! figures and ranked insight cards, and serves table views in-process via
//! DuckDB.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use sol_analytics_sdk::models::Layout;
//! use sol_analytics_sdk::SolAnalyticsSdk;
//!
//! let sdk = SolAnalyticsSdk::builder().build().unwrap();
//! let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
//!
//! // Insight cards for the dashboard header
//! let insights = sdk.daily_insights(date, Layout::Compact).unwrap();
//!
//! // Volume ranking for the same day
//! let ranked = sdk
//!     .tables()
//!     .ranked(date, sol_analytics_sdk::columns::MetricKey::TotalVolume)
//!     .unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod columns;
pub mod config;
pub mod connection;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod insights;
pub mod models;
pub mod performance;
pub mod preferences;
pub mod queries;
pub mod session;
pub mod sql_builder;
pub mod trends;

#[cfg(feature = "async")]
pub use async_client::AsyncSolAnalyticsSdk;
pub use cache::CacheManager;
pub use connection::Connection;
pub use error::{AnalyticsError, Result};
pub use fetcher::{InMemoryFetcher, MetricsFetcher};
pub use insights::{derive_insights, select_insights, InsightConfig};
pub use performance::{DailyAnalysis, MetricsWindow};
pub use sql_builder::SqlBuilder;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::info;

use crate::config::DataType;
use crate::models::{Insight, Layout, ProtocolCatalog};
use crate::preferences::PreferenceStore;
use crate::session::AnalysisSession;

// ---------------------------------------------------------------------------
// SolAnalyticsSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`SolAnalyticsSdk`] instance.
///
/// Use [`SolAnalyticsSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](SolAnalyticsSdkBuilder::build) to create the SDK.
#[derive(Debug, Clone)]
pub struct SolAnalyticsSdkBuilder {
    api_base: Option<String>,
    cache_dir: Option<PathBuf>,
    preferences_path: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    data_type: DataType,
    catalog: Option<ProtocolCatalog>,
    insight_config: InsightConfig,
}

impl Default for SolAnalyticsSdkBuilder {
    fn default() -> Self {
        Self {
            api_base: None,
            cache_dir: None,
            preferences_path: None,
            offline: false,
            timeout: Duration::from_secs(30),
            data_type: DataType::default(),
            catalog: None,
            insight_config: InsightConfig::default(),
        }
    }
}

impl SolAnalyticsSdkBuilder {
    /// Set the backend API base URL.
    ///
    /// If not set, `SOL_ANALYTICS_API_URL` is consulted, then
    /// `http://localhost:3001/api`.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    /// Set a custom cache directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/sol-analytics` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set where display preferences are stored.
    pub fn preferences_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.preferences_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, the SDK never calls the backend and only uses
    /// previously cached snapshots. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout for backend calls.
    ///
    /// Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Select the private or public dataset. Defaults to private.
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Replace the built-in protocol catalog.
    pub fn catalog(mut self, catalog: ProtocolCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Override the insight rule thresholds.
    pub fn insight_config(mut self, config: InsightConfig) -> Self {
        self.insight_config = config;
        self
    }

    /// Build the SDK, initializing the cache and DuckDB connection.
    ///
    /// Nothing is fetched eagerly; snapshots are loaded on first query.
    pub fn build(self) -> Result<SolAnalyticsSdk> {
        let mut cache = CacheManager::new(self.cache_dir, self.offline, self.timeout)?
            .with_data_type(self.data_type);
        if let Some(base) = self.api_base {
            cache = cache.with_api_base(base);
        }
        let catalog = self.catalog.unwrap_or_else(ProtocolCatalog::builtin);
        let conn = Connection::new(cache, catalog)?;
        Ok(SolAnalyticsSdk {
            conn,
            insight_config: self.insight_config,
            session: AnalysisSession::new(),
            preferences: PreferenceStore::new(self.preferences_path),
        })
    }
}

// ---------------------------------------------------------------------------
// SolAnalyticsSdk
// ---------------------------------------------------------------------------

/// The main entry point for the analytics SDK.
///
/// Wraps a [`Connection`] (which owns the [`CacheManager`] and DuckDB database)
/// and exposes the insight pipeline plus query interfaces as lightweight
/// borrowing wrappers.
///
/// Created via [`SolAnalyticsSdk::builder()`].
pub struct SolAnalyticsSdk {
    conn: Connection,
    insight_config: InsightConfig,
    session: AnalysisSession,
    preferences: PreferenceStore,
}

impl SolAnalyticsSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> SolAnalyticsSdkBuilder {
        SolAnalyticsSdkBuilder::default()
    }

    // -- Insight pipeline --------------------------------------------------

    /// Fetch `date` plus 30 days of history and run the full pipeline.
    ///
    /// Any fetch failure aborts the analysis; nothing partial is returned.
    pub fn analyze(&self, date: NaiveDate) -> Result<DailyAnalysis> {
        let window = {
            let mut cache = self.conn.cache.borrow_mut();
            MetricsWindow::fetch(&mut *cache, date, config::HISTORY_DAYS)?
        };
        Ok(DailyAnalysis::from_window(
            &window,
            self.conn.catalog(),
            &self.insight_config,
        ))
    }

    /// The insight cards for `date`, truncated for `layout`.
    ///
    /// Fails with [`AnalyticsError::Superseded`] if another analysis was
    /// begun on this SDK's [`session()`](Self::session) in the meantime.
    pub fn daily_insights(&self, date: NaiveDate, layout: Layout) -> Result<Vec<Insight>> {
        let ticket = self.session.begin(date);
        let analysis = self.analyze(date)?;
        let selected = select_insights(analysis.insights, layout.max_insights());
        self.session.finish(ticket, selected)
    }

    // -- Query accessors ---------------------------------------------------

    /// Access the raw metrics query interface.
    pub fn metrics(&self) -> queries::metrics::MetricsQuery<'_> {
        queries::metrics::MetricsQuery::new(&self.conn)
    }

    /// Access the ranked and aggregated table views.
    pub fn tables(&self) -> queries::tables::TableQuery<'_> {
        queries::tables::TableQuery::new(&self.conn)
    }

    // -- Configuration and utility methods ---------------------------------

    /// The persisted display preferences.
    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    pub fn catalog(&self) -> &ProtocolCatalog {
        self.conn.catalog()
    }

    pub fn insight_config(&self) -> &InsightConfig {
        &self.insight_config
    }

    /// The generation guard shared by every analysis on this SDK.
    ///
    /// Clone it to hand to other threads that start analyses.
    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// Execute a raw SQL query against the DuckDB database.
    ///
    /// Only dates already loaded by earlier queries are present in
    /// `daily_metrics`.
    ///
    /// # Arguments
    ///
    /// * `query` - SQL string with `?` positional placeholders.
    /// * `params` - Parameter values corresponding to the placeholders.
    pub fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.conn.execute(query, params)
    }

    /// Clear the snapshot cache and unload every date from DuckDB.
    pub fn refresh(&self) -> Result<()> {
        self.conn.cache.borrow().clear()?;
        self.conn.reset()?;
        info!("snapshot cache cleared and tables reset");
        Ok(())
    }

    /// Consume the SDK and release all resources.
    pub fn close(self) {
        self.conn.cache.borrow_mut().close();
        drop(self);
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for SolAnalyticsSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.conn.cache.borrow();
        write!(
            f,
            "SolAnalyticsSdk(api={}, data_type={}, cache_dir={}, loaded_dates={}, offline={})",
            cache.api_base(),
            cache.data_type().as_str(),
            cache.cache_dir.display(),
            self.conn.loaded_dates().len(),
            cache.offline
        )
    }
}
