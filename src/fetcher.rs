//! The metrics source seam.
//!
//! [`CacheManager`](crate::cache::CacheManager) implements [`MetricsFetcher`]
//! against the backend API; [`InMemoryFetcher`] serves fixed snapshots for
//! replays and tests.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};

use crate::error::{AnalyticsError, Result};
use crate::models::{DailySnapshot, OptimizedMetrics, ProtocolId};

pub trait MetricsFetcher {
    /// Every protocol's metrics for `date`.
    fn daily_metrics(&mut self, date: NaiveDate) -> Result<DailySnapshot>;

    /// Bulk per-protocol summary with a trailing 7-day series.
    fn optimized_metrics(&mut self, date: NaiveDate)
        -> Result<BTreeMap<ProtocolId, OptimizedMetrics>>;

    /// Snapshots for the `days` dates strictly before `date`, keyed by date.
    fn daily_metrics_before(
        &mut self,
        date: NaiveDate,
        days: u64,
    ) -> Result<BTreeMap<NaiveDate, DailySnapshot>> {
        let mut out = BTreeMap::new();
        for offset in 1..=days {
            let day = date.checked_sub_days(Days::new(offset)).ok_or_else(|| {
                AnalyticsError::InvalidArgument(format!("date out of range: {} - {}d", date, offset))
            })?;
            out.insert(day, self.daily_metrics(day)?);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// InMemoryFetcher
// ---------------------------------------------------------------------------

/// Serves snapshots from memory. Dates without a snapshot are empty.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFetcher {
    snapshots: HashMap<NaiveDate, DailySnapshot>,
    optimized: HashMap<NaiveDate, BTreeMap<ProtocolId, OptimizedMetrics>>,
    requests: usize,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, snapshot: DailySnapshot) -> &mut Self {
        self.snapshots.insert(snapshot.date, snapshot);
        self
    }

    pub fn insert_optimized(
        &mut self,
        date: NaiveDate,
        metrics: BTreeMap<ProtocolId, OptimizedMetrics>,
    ) -> &mut Self {
        self.optimized.insert(date, metrics);
        self
    }

    /// Number of fetch calls served so far.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

impl MetricsFetcher for InMemoryFetcher {
    fn daily_metrics(&mut self, date: NaiveDate) -> Result<DailySnapshot> {
        self.requests += 1;
        Ok(self
            .snapshots
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DailySnapshot::empty(date)))
    }

    fn optimized_metrics(
        &mut self,
        date: NaiveDate,
    ) -> Result<BTreeMap<ProtocolId, OptimizedMetrics>> {
        self.requests += 1;
        Ok(self.optimized.get(&date).cloned().unwrap_or_default())
    }
}
