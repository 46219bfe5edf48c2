use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "http://localhost:3001/api";
pub const API_BASE_ENV: &str = "SOL_ANALYTICS_API_URL";

pub const DAILY_METRICS_PATH: &str = "metrics/daily";
pub const OPTIMIZED_METRICS_PATH: &str = "metrics/daily/optimized";

/// Days of history fetched behind the analysis date.
pub const HISTORY_DAYS: u64 = 30;

/// Snapshots at least this many days old are treated as final and never re-fetched.
pub const SETTLE_DAYS: u64 = 2;

/// Which backend dataset to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Private,
    Public,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Private => "private",
            DataType::Public => "public",
        }
    }
}

/// Resolve the API base URL: explicit value, then `SOL_ANALYTICS_API_URL`, then the default.
pub fn resolve_api_base(explicit: Option<String>) -> String {
    let base = explicit
        .or_else(|| std::env::var(API_BASE_ENV).ok())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    base.trim_end_matches('/').to_string()
}

pub fn endpoint_url(api_base: &str, path: &str, date: NaiveDate, data_type: DataType) -> String {
    format!(
        "{}/{}?date={}&dataType={}",
        api_base,
        path,
        date.format("%Y-%m-%d"),
        data_type.as_str()
    )
}

/// Whether a snapshot for `date` can no longer change, relative to `today`.
pub fn is_settled(date: NaiveDate, today: NaiveDate) -> bool {
    match today.checked_sub_days(Days::new(SETTLE_DAYS)) {
        Some(cutoff) => date <= cutoff,
        None => false,
    }
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("sol-analytics")
    } else {
        PathBuf::from(".sol-analytics-cache")
    }
}

pub fn default_preferences_path() -> PathBuf {
    let dir = match dirs::config_dir() {
        Some(config) => config.join("sol-analytics"),
        None => PathBuf::from(".sol-analytics"),
    };
    dir.join("preferences.json")
}
