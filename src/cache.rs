//! Backend API client and local snapshot cache.
//!
//! Fetches daily metrics from the analytics API and caches each date as a
//! gzip-compressed JSON file. Settled dates (older than yesterday) are served
//! from the cache; recent dates are re-fetched because the backend may still
//! be filling them in.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{self, DataType};
use crate::error::{AnalyticsError, Result};
use crate::fetcher::MetricsFetcher;
use crate::models::{
    parse_optimized_payload, DailySnapshot, OptimizedMetrics, ProtocolId, ProtocolMetrics,
};

const DAILY_DIR: &str = "daily";
const OPTIMIZED_DIR: &str = "optimized";

/// Fetches metrics from the backend API and caches them on disk.
///
/// Cheap to clone. Clones made after [`client`](Self::client) has been called
/// share its connection pool; cache writes are atomic, so clones may fetch
/// different dates concurrently.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cached snapshots are stored.
    pub cache_dir: PathBuf,
    /// If true, never call the API (use cached snapshots only).
    pub offline: bool,
    api_base: String,
    data_type: DataType,
    timeout: Duration,
    client: Option<Client>,
}

impl CacheManager {
    /// Create a new cache manager.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache directory.
    /// Creates the cache directory if it does not exist. The API base comes
    /// from `SOL_ANALYTICS_API_URL` or the built-in default.
    pub fn new(cache_dir: Option<PathBuf>, offline: bool, timeout: Duration) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            cache_dir: dir,
            offline,
            api_base: config::resolve_api_base(None),
            data_type: DataType::default(),
            timeout,
            client: None,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = config::resolve_api_base(Some(api_base.into()));
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Lazy HTTP client, created on first use.
    pub fn client(&mut self) -> Result<Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    fn snapshot_path(&self, kind: &str, date: NaiveDate) -> PathBuf {
        self.cache_dir
            .join(self.data_type.as_str())
            .join(kind)
            .join(format!("{}.json.gz", date.format("%Y-%m-%d")))
    }

    /// Locate a cached file for `date`, accepting a plain `.json` export too.
    fn cached_path(&self, kind: &str, date: NaiveDate) -> Option<PathBuf> {
        let gz = self.snapshot_path(kind, date);
        if gz.exists() {
            return Some(gz);
        }
        let plain = gz.with_extension("");
        plain.exists().then_some(plain)
    }

    /// Whether the cached daily snapshot for `date` must be refreshed before use.
    ///
    /// Returns `true` if there is no cached copy or the date is recent enough
    /// that the backend may still change it. Cached copies are never stale offline.
    pub fn is_stale(&self, date: NaiveDate) -> bool {
        self.is_stale_kind(DAILY_DIR, date)
    }

    fn is_stale_kind(&self, kind: &str, date: NaiveDate) -> bool {
        if self.cached_path(kind, date).is_none() {
            return true;
        }
        !self.offline && !config::is_settled(date, Utc::now().date_naive())
    }

    /// GET one endpoint for `date`. A 404 means the backend has no data for
    /// that date and yields `None`; settled 404 dates are cached as empty.
    fn fetch_payload(&mut self, path: &str, date: NaiveDate) -> Result<Option<serde_json::Value>> {
        let url = config::endpoint_url(&self.api_base, path, date, self.data_type);
        info!(%url, "fetching metrics");

        let client = self.client()?;
        let resp = client.get(&url).send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!(%date, "no metrics published for date");
            return Ok(None);
        }
        let payload = resp.error_for_status()?.json::<serde_json::Value>()?;
        Ok(Some(payload))
    }

    /// Serve `date` from the cache when fresh, else fetch, decode and store it.
    fn load_or_fetch<T, F>(
        &mut self,
        kind: &str,
        endpoint: &str,
        date: NaiveDate,
        decode: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(serde_json::Value) -> Result<T>,
    {
        if !self.is_stale_kind(kind, date) {
            if let Some(path) = self.cached_path(kind, date) {
                match read_cached::<T>(&path) {
                    Ok(value) => {
                        debug!(path = %path.display(), "cache hit");
                        return Ok(value);
                    }
                    Err(e) if self.offline => return Err(e),
                    Err(_) => {}
                }
            }
        }

        if self.offline {
            return Err(AnalyticsError::NotFound(format!(
                "{} metrics for {} not cached and offline mode is enabled",
                kind, date
            )));
        }

        match self.fetch_payload(endpoint, date)? {
            Some(payload) => {
                let value = decode(payload)?;
                write_cached(&self.snapshot_path(kind, date), &value)?;
                Ok(value)
            }
            None => {
                let empty = T::default();
                if config::is_settled(date, Utc::now().date_naive()) {
                    write_cached(&self.snapshot_path(kind, date), &empty)?;
                }
                Ok(empty)
            }
        }
    }

    /// Store a snapshot in the cache as if it had been fetched.
    pub fn store_snapshot(&self, snapshot: &DailySnapshot) -> Result<PathBuf> {
        let path = self.snapshot_path(DAILY_DIR, snapshot.date);
        write_cached(&path, &CachedDaily::from(snapshot.clone()))?;
        Ok(path)
    }

    pub fn store_optimized(
        &self,
        date: NaiveDate,
        metrics: &BTreeMap<ProtocolId, OptimizedMetrics>,
    ) -> Result<PathBuf> {
        let path = self.snapshot_path(OPTIMIZED_DIR, date);
        write_cached(&path, metrics)?;
        Ok(path)
    }

    /// Dates with a cached daily snapshot, ascending.
    pub fn cached_dates(&self) -> Result<Vec<NaiveDate>> {
        let dir = self.cache_dir.join(self.data_type.as_str()).join(DAILY_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut dates: Vec<NaiveDate> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let stem = name.split('.').next()?.to_string();
                NaiveDate::parse_from_str(&stem, "%Y-%m-%d").ok()
            })
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    /// Remove all cached files and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Close the HTTP client, if open.
    pub fn close(&mut self) {
        self.client = None;
    }
}

impl MetricsFetcher for CacheManager {
    fn daily_metrics(&mut self, date: NaiveDate) -> Result<DailySnapshot> {
        let cached: CachedDaily =
            self.load_or_fetch(DAILY_DIR, config::DAILY_METRICS_PATH, date, |payload| {
                DailySnapshot::from_payload(date, payload).map(CachedDaily::from)
            })?;
        Ok(cached.into_snapshot(date))
    }

    fn optimized_metrics(
        &mut self,
        date: NaiveDate,
    ) -> Result<BTreeMap<ProtocolId, OptimizedMetrics>> {
        self.load_or_fetch(OPTIMIZED_DIR, config::OPTIMIZED_METRICS_PATH, date, |payload| {
            parse_optimized_payload(date, payload)
        })
    }
}

// ---------------------------------------------------------------------------
// On-disk format
// ---------------------------------------------------------------------------

/// A daily snapshot as stored on disk; the date is implied by the file name.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CachedDaily {
    protocols: BTreeMap<ProtocolId, ProtocolMetrics>,
}

impl From<DailySnapshot> for CachedDaily {
    fn from(snapshot: DailySnapshot) -> Self {
        Self {
            protocols: snapshot.protocols,
        }
    }
}

impl CachedDaily {
    fn into_snapshot(self, date: NaiveDate) -> DailySnapshot {
        DailySnapshot {
            date,
            protocols: self.protocols,
        }
    }
}

/// Write `value` as gzip JSON through a temp file in the same directory, so an
/// interrupted write never leaves a partial file behind.
fn write_cached<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| AnalyticsError::InvalidArgument(format!("no parent dir: {}", path.display())))?;
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut encoder = GzEncoder::new(&mut tmp, Compression::default());
        serde_json::to_writer(&mut encoder, value)?;
        encoder.finish()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), "cached");
    Ok(())
}

/// Load and parse a cached file (handles `.gz` transparently).
///
/// If the cached file is corrupt (truncated write, disk error), it is
/// deleted so the next call re-fetches a fresh copy.
fn read_cached<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path)?;
    let mut contents = String::new();
    let read = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        BufReader::new(GzDecoder::new(BufReader::new(file))).read_to_string(&mut contents)
    } else {
        BufReader::new(file).read_to_string(&mut contents)
    };

    let parsed = match read {
        Ok(_) => serde_json::from_str::<T>(&contents).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match parsed {
        Ok(value) => Ok(value),
        Err(reason) => {
            warn!(path = %path.display(), error = %reason, "corrupt cache file, removing");
            let _ = fs::remove_file(path);
            Err(AnalyticsError::NotFound(format!(
                "Cache file '{}' was corrupt and has been removed. \
                 Retry to re-fetch. Original error: {}",
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown"),
                reason
            )))
        }
    }
}
