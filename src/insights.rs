//! Daily insight derivation.
//!
//! A fixed, ordered rule set runs over every protocol's [`ProtocolPerformance`]
//! and the day's [`AggregateTotals`]. Each rule emits at most one [`Insight`];
//! output order is rule order, never magnitude. Thresholds live in
//! [`InsightConfig`].
//!
//! # Example
//!
//! ```rust
//! use sol_analytics_sdk::insights::{derive_insights, select_insights, InsightConfig};
//! use sol_analytics_sdk::models::{AggregateTotals, Layout};
//!
//! let insights = derive_insights(&[], &AggregateTotals::default(), &InsightConfig::default());
//! assert!(select_insights(insights, Layout::Compact.max_insights()).is_empty());
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::format::{format_count, format_currency, format_percent, format_signed_percent};
use crate::models::{AggregateTotals, Insight, InsightKind, ProtocolCatalog, ProtocolPerformance};
use crate::trends::VolumeStats;

pub const VOLUME_LEADER: &str = "Volume Leader";
pub const BREAKOUT_PERFORMANCE: &str = "Breakout Performance";
pub const RELIABLE_HIGH_PERFORMER: &str = "Reliable High Performer";
pub const STABLE_MARKET_LEADER: &str = "Stable Market Leader";
pub const USER_ACQUISITION_LEADER: &str = "User Acquisition Leader";
pub const PERFORMANCE_CONCERN: &str = "Performance Concern";
pub const HIGH_VALUE_TRADING_DAY: &str = "High-Value Trading Day";
pub const MARKET_CONCENTRATION: &str = "Market Concentration";
pub const STRONG_USER_ACQUISITION: &str = "Strong User Acquisition";

// ---------------------------------------------------------------------------
// InsightConfig
// ---------------------------------------------------------------------------

/// Thresholds for the insight rules. Fractions are unscaled (0.05 = 5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Day-over-day volume growth a breakout must exceed.
    pub breakout_threshold: f64,
    pub reliable_volume_floor: f64,
    pub reliable_min_history_days: usize,
    pub stable_leader_enabled: bool,
    /// Both the candidate floor and the per-day bar for the stable leader rule.
    pub stable_leader_volume_floor: f64,
    pub stable_leader_candidates: usize,
    pub stable_leader_min_days: usize,
    /// `volume_7d` must stay above this.
    pub stable_leader_min_trend: f64,
    pub user_growth_threshold: f64,
    pub concern_volume_floor: f64,
    /// `volume_7d` must fall below this.
    pub concern_decline_threshold: f64,
    /// Average USD per trade.
    pub high_value_trade_size: f64,
    pub concentration_threshold: f64,
    pub new_user_rate_threshold: f64,
    /// Default number of insights shown when no layout is specified.
    pub max_insights: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            breakout_threshold: 0.05,
            reliable_volume_floor: 500_000.0,
            reliable_min_history_days: 5,
            stable_leader_enabled: true,
            stable_leader_volume_floor: 1_000_000.0,
            stable_leader_candidates: 3,
            stable_leader_min_days: 5,
            stable_leader_min_trend: -0.1,
            user_growth_threshold: 0.10,
            concern_volume_floor: 100_000.0,
            concern_decline_threshold: -0.20,
            high_value_trade_size: 2_000.0,
            concentration_threshold: 0.4,
            new_user_rate_threshold: 0.15,
            max_insights: 6,
        }
    }
}

// ---------------------------------------------------------------------------
// InsightEngine
// ---------------------------------------------------------------------------

/// Evaluates the rule set. Holds no state between calls.
pub struct InsightEngine<'a> {
    config: &'a InsightConfig,
    catalog: Option<&'a ProtocolCatalog>,
}

impl<'a> InsightEngine<'a> {
    pub fn new(config: &'a InsightConfig) -> Self {
        Self {
            config,
            catalog: None,
        }
    }

    /// Use display names from `catalog` in descriptions instead of raw ids.
    pub fn with_catalog(mut self, catalog: &'a ProtocolCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Run every rule in order and collect the insights that fire.
    pub fn derive(
        &self,
        performances: &[ProtocolPerformance],
        totals: &AggregateTotals,
    ) -> Vec<Insight> {
        let active: Vec<&ProtocolPerformance> =
            performances.iter().filter(|p| p.volume() > 0.0).collect();

        let leader = max_by(active.iter().copied(), |p| p.volume());

        let mut out = Vec::new();
        out.extend(leader.map(|p| self.volume_leader(p)));
        out.extend(self.breakout(&active));
        out.extend(self.reliable_performer(&active));
        out.extend(self.stable_leader(&active, leader));
        out.extend(self.user_acquisition_leader(&active));
        out.extend(self.performance_concern(&active));
        out.extend(self.high_value_day(totals));
        out.extend(leader.and_then(|p| self.market_concentration(p, totals)));
        out.extend(self.strong_user_acquisition(totals));
        out
    }

    fn name(&self, p: &ProtocolPerformance) -> String {
        match self.catalog {
            Some(catalog) => catalog.name(&p.protocol),
            None => p.protocol.to_string(),
        }
    }

    fn volume_leader(&self, p: &ProtocolPerformance) -> Insight {
        Insight {
            kind: InsightKind::Success,
            title: VOLUME_LEADER.to_string(),
            description: format!(
                "{} led all protocols with {} in daily volume",
                self.name(p),
                format_currency(p.volume())
            ),
            protocol: Some(p.protocol.clone()),
            value: Some(format_currency(p.volume())),
            trend: Some(p.trends.volume_1d),
        }
    }

    fn breakout(&self, active: &[&ProtocolPerformance]) -> Option<Insight> {
        let best = max_by(
            active.iter().copied().filter(|p| p.trends.volume_1d > 0.0),
            |p| p.trends.volume_1d,
        )?;
        if best.trends.volume_1d <= self.config.breakout_threshold {
            return None;
        }
        Some(Insight {
            kind: InsightKind::Success,
            title: BREAKOUT_PERFORMANCE.to_string(),
            description: format!(
                "{} volume jumped {} day over day to {}",
                self.name(best),
                format_signed_percent(best.trends.volume_1d),
                format_currency(best.volume())
            ),
            protocol: Some(best.protocol.clone()),
            value: Some(format_signed_percent(best.trends.volume_1d)),
            trend: Some(best.trends.volume_1d),
        })
    }

    fn reliable_performer(&self, active: &[&ProtocolPerformance]) -> Option<Insight> {
        let best = max_by(
            active.iter().copied().filter(|p| {
                p.volume() >= self.config.reliable_volume_floor
                    && p.previous_7d.len() >= self.config.reliable_min_history_days
            }),
            |p| p.trends.reliability,
        )?;
        let stats = VolumeStats::of(&best.previous_7d);
        Some(Insight {
            kind: InsightKind::Info,
            title: RELIABLE_HIGH_PERFORMER.to_string(),
            description: format!(
                "{} averaged {} per day over the last week with {:.1}% volatility",
                self.name(best),
                format_currency(stats.mean),
                stats.volatility_pct()
            ),
            protocol: Some(best.protocol.clone()),
            value: Some(format_currency(stats.mean)),
            trend: Some(best.trends.volume_7d),
        })
    }

    fn stable_leader(
        &self,
        active: &[&ProtocolPerformance],
        leader: Option<&ProtocolPerformance>,
    ) -> Option<Insight> {
        if !self.config.stable_leader_enabled {
            return None;
        }
        let leader = leader?;
        let floor = self.config.stable_leader_volume_floor;

        let mut ranked: Vec<&ProtocolPerformance> = active.to_vec();
        ranked.sort_by(|a, b| prefer(a.volume(), b.volume(), a, b));

        let stable = ranked
            .into_iter()
            .take(self.config.stable_leader_candidates)
            .filter(|p| p.volume() >= floor)
            .find(|p| {
                let strong_days = p
                    .previous_7d
                    .iter()
                    .filter(|m| m.total_volume_usd > floor)
                    .count();
                strong_days >= self.config.stable_leader_min_days
                    && p.trends.volume_7d > self.config.stable_leader_min_trend
            })?;

        if stable.protocol != leader.protocol {
            return None;
        }
        let strong_days = stable
            .previous_7d
            .iter()
            .filter(|m| m.total_volume_usd > floor)
            .count();
        Some(Insight {
            kind: InsightKind::Success,
            title: STABLE_MARKET_LEADER.to_string(),
            description: format!(
                "{} holds the top spot with {} of the last {} days above {}",
                self.name(stable),
                strong_days,
                stable.previous_7d.len(),
                format_currency(floor)
            ),
            protocol: Some(stable.protocol.clone()),
            value: Some(format_currency(stable.volume())),
            trend: Some(stable.trends.volume_7d),
        })
    }

    fn user_acquisition_leader(&self, active: &[&ProtocolPerformance]) -> Option<Insight> {
        let best = max_by(
            active.iter().copied().filter(|p| p.trends.users_7d > 0.0),
            |p| p.trends.users_7d,
        )?;
        if best.trends.users_7d <= self.config.user_growth_threshold {
            return None;
        }
        Some(Insight {
            kind: InsightKind::Success,
            title: USER_ACQUISITION_LEADER.to_string(),
            description: format!(
                "{} daily users are {} above their 7-day average at {}",
                self.name(best),
                format_signed_percent(best.trends.users_7d),
                format_count(best.current.daily_users as f64)
            ),
            protocol: Some(best.protocol.clone()),
            value: Some(format_signed_percent(best.trends.users_7d)),
            trend: Some(best.trends.users_7d),
        })
    }

    fn performance_concern(&self, active: &[&ProtocolPerformance]) -> Option<Insight> {
        let is_concern = |p: &ProtocolPerformance| {
            p.volume() > self.config.concern_volume_floor
                && p.trends.volume_7d < self.config.concern_decline_threshold
        };
        let worst = min_by(
            active.iter().copied().filter(|p| is_concern(*p)),
            |p| p.trends.volume_7d,
        )?;
        if !is_concern(worst) {
            return None;
        }
        Some(Insight {
            kind: InsightKind::Alert,
            title: PERFORMANCE_CONCERN.to_string(),
            description: format!(
                "{} volume is {} against its 7-day average",
                self.name(worst),
                format_signed_percent(worst.trends.volume_7d)
            ),
            protocol: Some(worst.protocol.clone()),
            value: Some(format_signed_percent(worst.trends.volume_7d)),
            trend: Some(worst.trends.volume_7d),
        })
    }

    fn high_value_day(&self, totals: &AggregateTotals) -> Option<Insight> {
        let avg_trade_size = if totals.total_trades > 0 {
            totals.total_volume / totals.total_trades as f64
        } else {
            0.0
        };
        if avg_trade_size <= self.config.high_value_trade_size {
            return None;
        }
        Some(Insight {
            kind: InsightKind::Info,
            title: HIGH_VALUE_TRADING_DAY.to_string(),
            description: format!(
                "Average trade size reached {} across {} trades",
                format_currency(avg_trade_size),
                format_count(totals.total_trades as f64)
            ),
            protocol: None,
            value: Some(format_currency(avg_trade_size)),
            trend: None,
        })
    }

    fn market_concentration(
        &self,
        leader: &ProtocolPerformance,
        totals: &AggregateTotals,
    ) -> Option<Insight> {
        let share = if totals.total_volume > 0.0 {
            leader.volume() / totals.total_volume
        } else {
            0.0
        };
        if share <= self.config.concentration_threshold {
            return None;
        }
        Some(Insight {
            kind: InsightKind::Warning,
            title: MARKET_CONCENTRATION.to_string(),
            description: format!(
                "{} captured {} of total volume",
                self.name(leader),
                format_percent(share)
            ),
            protocol: Some(leader.protocol.clone()),
            value: Some(format_percent(share)),
            trend: None,
        })
    }

    fn strong_user_acquisition(&self, totals: &AggregateTotals) -> Option<Insight> {
        let rate = if totals.total_users > 0 {
            totals.total_new_users as f64 / totals.total_users as f64
        } else {
            0.0
        };
        if rate <= self.config.new_user_rate_threshold {
            return None;
        }
        Some(Insight {
            kind: InsightKind::Success,
            title: STRONG_USER_ACQUISITION.to_string(),
            description: format!(
                "{} of {} active users were new today",
                format_percent(rate),
                format_count(totals.total_users as f64)
            ),
            protocol: None,
            value: Some(format_percent(rate)),
            trend: None,
        })
    }
}

/// Run the rule set with raw protocol ids in descriptions.
pub fn derive_insights(
    performances: &[ProtocolPerformance],
    totals: &AggregateTotals,
    config: &InsightConfig,
) -> Vec<Insight> {
    InsightEngine::new(config).derive(performances, totals)
}

/// Keep the first `limit` insights in rule order.
pub fn select_insights(mut insights: Vec<Insight>, limit: usize) -> Vec<Insight> {
    insights.truncate(limit);
    insights
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Order `a` before `b` when `a_key` is greater; equal keys fall back to the smaller id.
fn prefer(
    a_key: f64,
    b_key: f64,
    a: &ProtocolPerformance,
    b: &ProtocolPerformance,
) -> Ordering {
    b_key
        .total_cmp(&a_key)
        .then_with(|| a.protocol.cmp(&b.protocol))
}

fn max_by<'p>(
    candidates: impl Iterator<Item = &'p ProtocolPerformance>,
    key: impl Fn(&ProtocolPerformance) -> f64,
) -> Option<&'p ProtocolPerformance> {
    candidates.min_by(|a, b| prefer(key(a), key(b), a, b))
}

fn min_by<'p>(
    candidates: impl Iterator<Item = &'p ProtocolPerformance>,
    key: impl Fn(&ProtocolPerformance) -> f64,
) -> Option<&'p ProtocolPerformance> {
    candidates.min_by(|a, b| {
        key(a)
            .total_cmp(&key(b))
            .then_with(|| a.protocol.cmp(&b.protocol))
    })
}
