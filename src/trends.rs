//! Trend calculation: relative deltas and the 7-day reliability score.
//!
//! All ratios short-circuit to `0.0` when their baseline is not positive,
//! so no trend is ever `NaN` or infinite.

use crate::models::{ProtocolMetrics, TrendSet};

/// History bundle for one protocol on one analysis date.
#[derive(Debug, Clone, Copy)]
pub struct TrendInput<'a> {
    pub current: &'a ProtocolMetrics,
    pub previous_day: Option<&'a ProtocolMetrics>,
    pub previous_7d: &'a [ProtocolMetrics],
    pub previous_30d: &'a [ProtocolMetrics],
}

/// Relative change of `current` against `baseline`, or 0 when the baseline is not positive.
pub fn delta(current: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (current - baseline) / baseline
    } else {
        0.0
    }
}

/// Arithmetic mean with a `max(count, 1)` denominator.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len().max(1) as f64
}

/// Population standard deviation; 0 for fewer than two values.
pub fn population_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

// ---------------------------------------------------------------------------
// VolumeStats
// ---------------------------------------------------------------------------

/// Summary of a daily volume series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeStats {
    pub mean: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub days: usize,
}

impl VolumeStats {
    pub fn of(series: &[ProtocolMetrics]) -> Self {
        let volumes: Vec<f64> = series.iter().map(|m| m.total_volume_usd).collect();
        if volumes.is_empty() {
            return Self::default();
        }
        Self {
            mean: mean(&volumes),
            stdev: population_stdev(&volumes),
            min: volumes.iter().copied().fold(f64::INFINITY, f64::min),
            max: volumes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            days: volumes.len(),
        }
    }

    /// Standard deviation relative to the mean, 0 when the mean is 0.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean > 0.0 {
            self.stdev / self.mean
        } else {
            0.0
        }
    }

    /// `mean / (1 + cv)`: rewards both a high average and a steady series.
    pub fn reliability(&self) -> f64 {
        if self.mean > 0.0 {
            self.mean * (1.0 / (1.0 + self.coefficient_of_variation()))
        } else {
            0.0
        }
    }

    /// Range of the series as a percentage of its mean.
    pub fn volatility_pct(&self) -> f64 {
        if self.mean > 0.0 {
            (self.max - self.min) / self.mean * 100.0
        } else {
            0.0
        }
    }
}

fn mean_of(series: &[ProtocolMetrics], field: fn(&ProtocolMetrics) -> f64) -> f64 {
    let values: Vec<f64> = series.iter().map(field).collect();
    mean(&values)
}

/// Compute the full [`TrendSet`] for one protocol.
pub fn calculate(input: &TrendInput<'_>) -> TrendSet {
    let current = input.current;
    let previous = input.previous_day.copied().unwrap_or_default();

    let week = VolumeStats::of(input.previous_7d);
    let avg_30d_volume = mean_of(input.previous_30d, |m| m.total_volume_usd);
    let avg_7d_users = mean_of(input.previous_7d, |m| m.daily_users as f64);

    TrendSet {
        volume_1d: delta(current.total_volume_usd, previous.total_volume_usd),
        volume_7d: delta(current.total_volume_usd, week.mean),
        volume_30d: delta(current.total_volume_usd, avg_30d_volume),
        users_1d: delta(current.daily_users as f64, previous.daily_users as f64),
        users_7d: delta(current.daily_users as f64, avg_7d_users),
        trades_1d: delta(current.daily_trades as f64, previous.daily_trades as f64),
        reliability: week.reliability(),
    }
}
