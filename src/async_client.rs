//! Async wrapper around [`SolAnalyticsSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Sync SDK operations run on the blocking thread pool via
//! [`tokio::task::spawn_blocking`]. [`AsyncSolAnalyticsSdk::daily_insights`]
//! additionally splits its 31 snapshot fetches into four groups (the day
//! itself, the day before, days 2-7 and days 8-30) that run concurrently
//! on cloned [`CacheManager`]s.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use sol_analytics_sdk::models::Layout;
//! use sol_analytics_sdk::AsyncSolAnalyticsSdk;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sdk = AsyncSolAnalyticsSdk::builder().build().await.unwrap();
//!     let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
//!
//!     let insights = sdk.daily_insights(date, Layout::Expanded).await.unwrap();
//!
//!     // Run any sync SDK method via closure
//!     let categories = sdk.run(move |s| s.tables().category_totals(date)).await.unwrap();
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::cache::CacheManager;
use crate::config::{DataType, HISTORY_DAYS};
use crate::error::{AnalyticsError, Result};
use crate::fetcher::MetricsFetcher;
use crate::insights::{select_insights, InsightConfig};
use crate::models::{DailySnapshot, Insight, Layout, ProtocolCatalog};
use crate::performance::{DailyAnalysis, MetricsWindow};
use crate::session::AnalysisSession;
use crate::{SolAnalyticsSdk, SolAnalyticsSdkBuilder};

fn join_error(e: tokio::task::JoinError) -> AnalyticsError {
    AnalyticsError::InvalidArgument(format!("Task join error: {e}"))
}

// ---------------------------------------------------------------------------
// AsyncSolAnalyticsSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncSolAnalyticsSdk`] instance.
///
/// Accepts the same options as [`SolAnalyticsSdkBuilder`].
#[derive(Debug, Clone, Default)]
pub struct AsyncSolAnalyticsSdkBuilder {
    inner: SolAnalyticsSdkBuilder,
}

impl AsyncSolAnalyticsSdkBuilder {
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.inner = self.inner.api_base(url);
        self
    }

    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.cache_dir(path);
        self
    }

    pub fn preferences_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.preferences_path(path);
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.inner = self.inner.offline(offline);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.inner = self.inner.data_type(data_type);
        self
    }

    pub fn catalog(mut self, catalog: ProtocolCatalog) -> Self {
        self.inner = self.inner.catalog(catalog);
        self
    }

    pub fn insight_config(mut self, config: InsightConfig) -> Self {
        self.inner = self.inner.insight_config(config);
        self
    }

    /// Build the async SDK, initializing the cache and DuckDB connection.
    ///
    /// Initialization runs on the blocking thread pool so it won't block
    /// the async event loop.
    pub async fn build(self) -> Result<AsyncSolAnalyticsSdk> {
        let builder = self.inner;
        tokio::task::spawn_blocking(move || {
            let sdk = builder.build()?;
            let fetcher = {
                let mut cache = sdk.connection().cache.borrow_mut();
                if !cache.offline {
                    cache.client()?;
                }
                cache.clone()
            };
            Ok(AsyncSolAnalyticsSdk {
                fetcher,
                catalog: sdk.catalog().clone(),
                insight_config: sdk.insight_config().clone(),
                session: sdk.session().clone(),
                inner: Arc::new(Mutex::new(sdk)),
            })
        })
        .await
        .map_err(join_error)?
    }
}

// ---------------------------------------------------------------------------
// AsyncSolAnalyticsSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`SolAnalyticsSdk`].
///
/// The underlying [`SolAnalyticsSdk`] is protected by a [`Mutex`] since it
/// uses `RefCell` internally. Insight analyses bypass it and fetch through
/// their own cache clones, sharing the SDK's [`AnalysisSession`].
pub struct AsyncSolAnalyticsSdk {
    inner: Arc<Mutex<SolAnalyticsSdk>>,
    fetcher: CacheManager,
    catalog: ProtocolCatalog,
    insight_config: InsightConfig,
    session: AnalysisSession,
}

impl AsyncSolAnalyticsSdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncSolAnalyticsSdkBuilder {
        AsyncSolAnalyticsSdkBuilder::default()
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives an `&SolAnalyticsSdk` reference and should return
    /// a `Result<T>`.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SolAnalyticsSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = sdk
                .lock()
                .map_err(|_| AnalyticsError::InvalidArgument("SDK lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(join_error)?
    }

    /// The generation guard shared with the wrapped SDK.
    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// Fetch the analysis window for `date` with the four fetch groups in flight
    /// at once. Fails if any group fails.
    pub async fn fetch_window(&self, date: NaiveDate) -> Result<MetricsWindow> {
        let (current, previous_day, week, month) = tokio::try_join!(
            self.fetch_days(date, 0..=0),
            self.fetch_days(date, 1..=1),
            self.fetch_days(date, 2..=7),
            self.fetch_days(date, 8..=HISTORY_DAYS),
        )?;

        let current = current
            .into_iter()
            .next()
            .unwrap_or_else(|| DailySnapshot::empty(date));
        let history = previous_day.into_iter().chain(week).chain(month);
        Ok(MetricsWindow::from_parts(date, current, history))
    }

    /// Fetch the snapshots `offsets` days before `date` on one blocking task.
    async fn fetch_days(
        &self,
        date: NaiveDate,
        offsets: std::ops::RangeInclusive<u64>,
    ) -> Result<Vec<DailySnapshot>> {
        let mut fetcher = self.fetcher.clone();
        tokio::task::spawn_blocking(move || {
            let mut out = Vec::new();
            for offset in offsets {
                if let Some(day) = date.checked_sub_days(Days::new(offset)) {
                    out.push(fetcher.daily_metrics(day)?);
                }
            }
            Ok(out)
        })
        .await
        .map_err(join_error)?
    }

    /// Run the full pipeline for `date`.
    pub async fn analyze(&self, date: NaiveDate) -> Result<DailyAnalysis> {
        let window = self.fetch_window(date).await?;
        Ok(DailyAnalysis::from_window(
            &window,
            &self.catalog,
            &self.insight_config,
        ))
    }

    /// The insight cards for `date`, truncated for `layout`.
    ///
    /// If [`daily_insights`](Self::daily_insights) is called again (for any
    /// date) before this one finishes, this call fails with
    /// [`AnalyticsError::Superseded`] so a slow, stale answer is never shown.
    pub async fn daily_insights(&self, date: NaiveDate, layout: Layout) -> Result<Vec<Insight>> {
        let ticket = self.session.begin(date);
        let analysis = self.analyze(date).await?;
        debug!(%date, insights = analysis.insights.len(), "analysis complete");
        self.session
            .finish(ticket, select_insights(analysis.insights, layout.max_insights()))
    }

    /// Execute a raw SQL query asynchronously.
    pub async fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let query = query.to_string();
        let params = params.to_vec();
        self.run(move |s| s.sql(&query, &params)).await
    }

    /// Clear the snapshot cache and reset loaded tables.
    pub async fn refresh(&self) -> Result<()> {
        self.run(|s| s.refresh()).await
    }

    /// Close the SDK, releasing the DuckDB connection and HTTP client on the
    /// blocking pool.
    pub async fn close(self) -> Result<()> {
        tokio::task::spawn_blocking(move || {
            drop(self);
            Ok(())
        })
        .await
        .map_err(join_error)?
    }
}
