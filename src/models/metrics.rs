use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AnalyticsError, Result};

// ---------------------------------------------------------------------------
// ProtocolId: Opaque identifier of a tracked bot / terminal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolId(String);

impl ProtocolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProtocolId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProtocolId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// ProtocolMetrics: One protocol's measurements for one day
// ---------------------------------------------------------------------------

/// Daily measurements for a single protocol.
///
/// The all-zero `Default` stands in for a protocol with no entry on a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMetrics {
    pub total_volume_usd: f64,
    pub daily_users: u64,
    pub new_users: u64,
    pub daily_trades: u64,
    pub total_fees_usd: f64,
}

// ---------------------------------------------------------------------------
// DailySnapshot: Every protocol's metrics for one date
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub protocols: BTreeMap<ProtocolId, ProtocolMetrics>,
}

impl DailySnapshot {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            protocols: BTreeMap::new(),
        }
    }

    /// Metrics for `protocol`, or all zeros when it has no entry.
    pub fn metrics(&self, protocol: &ProtocolId) -> ProtocolMetrics {
        self.protocols.get(protocol).copied().unwrap_or_default()
    }

    pub fn contains(&self, protocol: &ProtocolId) -> bool {
        self.protocols.contains_key(protocol)
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Decode a `/metrics/daily` response body.
    ///
    /// Accepts the bare protocol map or one wrapped in `{"data": ...}`.
    pub fn from_payload(date: NaiveDate, payload: Value) -> Result<Self> {
        let raw: BTreeMap<String, WireProtocolMetrics> =
            serde_json::from_value(extract_data(payload)).map_err(|e| {
                AnalyticsError::MalformedPayload(format!("daily metrics for {}: {}", date, e))
            })?;

        let protocols = raw
            .into_iter()
            .map(|(id, m)| (ProtocolId::from(id), m.into()))
            .collect();

        Ok(Self { date, protocols })
    }
}

// ---------------------------------------------------------------------------
// OptimizedMetrics: Bulk per-protocol summary with a trailing weekly series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedMetrics {
    #[serde(deserialize_with = "lenient_amount")]
    pub total_volume: f64,
    #[serde(deserialize_with = "lenient_count")]
    pub daily_users: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub new_users: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub trades: u64,
    #[serde(deserialize_with = "lenient_amount")]
    pub fees: f64,
    /// Trailing daily volumes, oldest first.
    #[serde(default)]
    pub weekly_trend: Vec<f64>,
    /// Precomputed day-over-day volume growth as a fraction.
    #[serde(default)]
    pub daily_growth: f64,
}

impl OptimizedMetrics {
    pub fn metrics(&self) -> ProtocolMetrics {
        ProtocolMetrics {
            total_volume_usd: self.total_volume,
            daily_users: self.daily_users,
            new_users: self.new_users,
            daily_trades: self.trades,
            total_fees_usd: self.fees,
        }
    }
}

/// Decode a `/metrics/daily/optimized` response body.
pub fn parse_optimized_payload(
    date: NaiveDate,
    payload: Value,
) -> Result<BTreeMap<ProtocolId, OptimizedMetrics>> {
    let raw: BTreeMap<String, OptimizedMetrics> = serde_json::from_value(extract_data(payload))
        .map_err(|e| {
            AnalyticsError::MalformedPayload(format!("optimized metrics for {}: {}", date, e))
        })?;
    Ok(raw
        .into_iter()
        .map(|(id, m)| (ProtocolId::from(id), m))
        .collect())
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Per-protocol record as served by the backend. Column names follow the
/// backend's CSV export; camelCase spellings are accepted too.
#[derive(Debug, Deserialize)]
struct WireProtocolMetrics {
    #[serde(alias = "totalVolumeUsd", deserialize_with = "lenient_amount")]
    total_volume_usd: f64,
    #[serde(alias = "dailyUsers", deserialize_with = "lenient_count")]
    daily_users: u64,
    #[serde(
        rename = "numberOfNewUsers",
        alias = "number_of_new_users",
        alias = "new_users",
        deserialize_with = "lenient_count"
    )]
    new_users: u64,
    #[serde(alias = "dailyTrades", deserialize_with = "lenient_count")]
    daily_trades: u64,
    #[serde(alias = "totalFeesUsd", deserialize_with = "lenient_amount")]
    total_fees_usd: f64,
}

impl From<WireProtocolMetrics> for ProtocolMetrics {
    fn from(w: WireProtocolMetrics) -> Self {
        ProtocolMetrics {
            total_volume_usd: w.total_volume_usd,
            daily_users: w.daily_users,
            new_users: w.new_users,
            daily_trades: w.daily_trades,
            total_fees_usd: w.total_fees_usd,
        }
    }
}

/// Parse a backend number: JSON numbers, numeric strings (including
/// scientific notation such as `"1.5e+06"`), and `null` / `"<nil>"` as zero.
pub fn parse_lenient_number(value: &Value) -> std::result::Result<f64, String> {
    let n = match value {
        Value::Null => 0.0,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("unrepresentable number {}", n))?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed == "<nil>" || trimmed.eq_ignore_ascii_case("null") {
                0.0
            } else {
                trimmed
                    .parse::<f64>()
                    .map_err(|_| format!("not a number: {:?}", s))?
            }
        }
        other => return Err(format!("expected a number, found {}", other)),
    };
    if !n.is_finite() {
        return Err(format!("non-finite number {:?}", value));
    }
    if n < 0.0 {
        return Err(format!("negative value {}", n));
    }
    Ok(n)
}

fn lenient_amount<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    let value = Value::deserialize(d)?;
    parse_lenient_number(&value).map_err(D::Error::custom)
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    let value = Value::deserialize(d)?;
    let n = parse_lenient_number(&value).map_err(D::Error::custom)?;
    Ok(n.round() as u64)
}

/// Extract the `"data"` field from a JSON wrapper, or return the value as-is
/// if there is no wrapper.
///
/// A lone `"data"` key only counts as a wrapper when its value is a map of
/// objects, so a protocol that happens to be named `data` is left alone.
fn extract_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && is_protocol_map(map.get("data")) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn is_protocol_map(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Object(inner)) => inner.values().all(Value::is_object),
        _ => false,
    }
}
