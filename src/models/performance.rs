use serde::{Deserialize, Serialize};

use super::metrics::{ProtocolId, ProtocolMetrics};

// ---------------------------------------------------------------------------
// TrendSet: Relative changes for one protocol on one analysis date
// ---------------------------------------------------------------------------

/// Fractional changes (0.05 = +5%) against the previous day and trailing means,
/// plus the 7-day reliability score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSet {
    pub volume_1d: f64,
    pub volume_7d: f64,
    pub volume_30d: f64,
    pub users_1d: f64,
    pub users_7d: f64,
    pub trades_1d: f64,
    pub reliability: f64,
}

// ---------------------------------------------------------------------------
// ProtocolPerformance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolPerformance {
    pub protocol: ProtocolId,
    pub current: ProtocolMetrics,
    pub previous_day: Option<ProtocolMetrics>,
    pub previous_7d: Vec<ProtocolMetrics>,
    pub previous_30d: Vec<ProtocolMetrics>,
    pub trends: TrendSet,
}

impl ProtocolPerformance {
    /// Build a performance record, computing its trends from the supplied history.
    pub fn new(
        protocol: ProtocolId,
        current: ProtocolMetrics,
        previous_day: Option<ProtocolMetrics>,
        previous_7d: Vec<ProtocolMetrics>,
        previous_30d: Vec<ProtocolMetrics>,
    ) -> Self {
        let trends = crate::trends::calculate(&crate::trends::TrendInput {
            current: &current,
            previous_day: previous_day.as_ref(),
            previous_7d: &previous_7d,
            previous_30d: &previous_30d,
        });
        Self {
            protocol,
            current,
            previous_day,
            previous_7d,
            previous_30d,
            trends,
        }
    }

    pub fn volume(&self) -> f64 {
        self.current.total_volume_usd
    }
}

// ---------------------------------------------------------------------------
// AggregateTotals: Market-wide sums for the analysis date
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTotals {
    pub total_volume: f64,
    pub total_trades: u64,
    pub total_users: u64,
    pub total_new_users: u64,
}

impl AggregateTotals {
    /// Sum the current-day metrics of every protocol with non-zero volume.
    pub fn from_performances(performances: &[ProtocolPerformance]) -> Self {
        performances
            .iter()
            .filter(|p| p.volume() > 0.0)
            .fold(Self::default(), |mut acc, p| {
                acc.total_volume += p.current.total_volume_usd;
                acc.total_trades += p.current.daily_trades;
                acc.total_users += p.current.daily_users;
                acc.total_new_users += p.current.new_users;
                acc
            })
    }
}
