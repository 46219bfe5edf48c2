//! Assembles per-protocol performance records from fetched snapshots.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::fetcher::MetricsFetcher;
use crate::insights::{InsightConfig, InsightEngine};
use crate::models::{
    AggregateTotals, DailySnapshot, Insight, ProtocolCatalog, ProtocolId, ProtocolMetrics, ProtocolPerformance,
};

/// The current-day snapshot plus the trailing history behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsWindow {
    pub date: NaiveDate,
    pub current: DailySnapshot,
    /// Snapshots for dates before `date`, keyed by date.
    pub history: BTreeMap<NaiveDate, DailySnapshot>,
}

impl MetricsWindow {
    /// Fetch `date` and the `lookback` days before it.
    ///
    /// Any fetch failure aborts the whole window.
    pub fn fetch<F: MetricsFetcher + ?Sized>(
        fetcher: &mut F,
        date: NaiveDate,
        lookback: u64,
    ) -> Result<Self> {
        let current = fetcher.daily_metrics(date)?;
        let history = fetcher.daily_metrics_before(date, lookback)?;
        debug!(%date, protocols = current.protocols.len(), days = history.len(), "metrics window fetched");
        Ok(Self::from_parts(date, current, history.into_values()))
    }

    /// Assemble a window from snapshots fetched elsewhere. History entries on
    /// or after `date` are dropped.
    pub fn from_parts(
        date: NaiveDate,
        current: DailySnapshot,
        history: impl IntoIterator<Item = DailySnapshot>,
    ) -> Self {
        let history = history
            .into_iter()
            .filter(|s| s.date < date)
            .map(|s| (s.date, s))
            .collect();
        Self {
            date,
            current,
            history,
        }
    }

    /// Entries for `protocol` on the days within `days` before the window date.
    /// Days on which the protocol has no data contribute nothing.
    fn trailing(&self, protocol: &ProtocolId, days: u64) -> Vec<ProtocolMetrics> {
        let Some(start) = self.date.checked_sub_days(Days::new(days)) else {
            return Vec::new();
        };
        self.history
            .range(start..self.date)
            .filter_map(|(_, snapshot)| snapshot.protocols.get(protocol).copied())
            .collect()
    }

    /// One performance record per protocol in the current snapshot, sorted by id.
    pub fn performances(&self) -> Vec<ProtocolPerformance> {
        let yesterday = self.date.checked_sub_days(Days::new(1));
        self.current
            .protocols
            .iter()
            .map(|(protocol, current)| {
                let previous_day = yesterday
                    .and_then(|d| self.history.get(&d))
                    .and_then(|s| s.protocols.get(protocol).copied());
                ProtocolPerformance::new(
                    protocol.clone(),
                    *current,
                    previous_day,
                    self.trailing(protocol, 7),
                    self.trailing(protocol, 30),
                )
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DailyAnalysis
// ---------------------------------------------------------------------------

/// Everything the insight pipeline produced for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAnalysis {
    pub date: NaiveDate,
    pub performances: Vec<ProtocolPerformance>,
    pub totals: AggregateTotals,
    /// All insights in rule order, before selection.
    pub insights: Vec<Insight>,
}

impl DailyAnalysis {
    /// Run the trend and insight pipeline over a fetched window.
    ///
    /// Pure: the same window, catalog and config always give the same result.
    pub fn from_window(
        window: &MetricsWindow,
        catalog: &ProtocolCatalog,
        config: &InsightConfig,
    ) -> Self {
        let performances = window.performances();
        let totals = AggregateTotals::from_performances(&performances);
        let insights = InsightEngine::new(config)
            .with_catalog(catalog)
            .derive(&performances, &totals);
        Self {
            date: window.date,
            performances,
            totals,
            insights,
        }
    }

    pub fn performance(&self, protocol: &str) -> Result<&ProtocolPerformance> {
        self.performances
            .iter()
            .find(|p| p.protocol.as_str() == protocol)
            .ok_or_else(|| {
                AnalyticsError::NotFound(format!("no metrics for {} on {}", protocol, self.date))
            })
    }
}
