//! Shared test fixtures for the analytics SDK integration tests.
//!
//! Provides metric/snapshot builders and `setup_sample_db()`, which returns a
//! `Connection` over an offline cache pre-seeded with a few days of snapshots.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use sol_analytics_sdk::models::{DailySnapshot, ProtocolCatalog, ProtocolId, ProtocolMetrics};
use sol_analytics_sdk::{CacheManager, Connection};

/// The analysis date used across the sample data.
pub const SAMPLE_DATE: (i32, u32, u32) = (2025, 3, 14);

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn sample_date() -> NaiveDate {
    d(SAMPLE_DATE.0, SAMPLE_DATE.1, SAMPLE_DATE.2)
}

pub fn days_before(date: NaiveDate, n: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(n)).unwrap()
}

/// Metrics with the given volume and trades; other fields derived for realism.
pub fn metrics(volume: f64, users: u64, new_users: u64, trades: u64) -> ProtocolMetrics {
    ProtocolMetrics {
        total_volume_usd: volume,
        daily_users: users,
        new_users,
        daily_trades: trades,
        total_fees_usd: volume * 0.01,
    }
}

pub fn volume_only(volume: f64) -> ProtocolMetrics {
    metrics(volume, 0, 0, 0)
}

pub fn snapshot(date: NaiveDate, rows: &[(&str, ProtocolMetrics)]) -> DailySnapshot {
    DailySnapshot {
        date,
        protocols: rows
            .iter()
            .map(|(id, m)| (ProtocolId::from(*id), *m))
            .collect(),
    }
}

/// An offline cache manager rooted in `dir`.
pub fn offline_cache(dir: &std::path::Path) -> CacheManager {
    CacheManager::new(Some(dir.to_path_buf()), true, Duration::from_secs(30)).unwrap()
}

/// Store empty snapshots for every date in `from..=to` not already cached.
pub fn fill_empty(cache: &CacheManager, from: NaiveDate, to: NaiveDate) {
    let cached = cache.cached_dates().unwrap();
    let mut day = from;
    while day <= to {
        if !cached.contains(&day) {
            cache.store_snapshot(&DailySnapshot::empty(day)).unwrap();
        }
        day = day.succ_opt().unwrap();
    }
}

/// Snapshots for the sample date:
///
/// | protocol | volume | users | new | trades |
/// |---|---|---|---|---|
/// | photon | 2,000,000 | 4,000 | 500 | 10,000 |
/// | trojan | 1,000,000 | 3,000 | 300 | 8,000 |
/// | bullx | 1,000,000 | 1,000 | 100 | 2,000 |
/// | axiom | 0 | 0 | 0 | 0 |
///
/// plus a short trojan history around the February/March boundary.
pub fn sample_snapshots() -> Vec<DailySnapshot> {
    let date = sample_date();
    let mut out = vec![snapshot(
        date,
        &[
            ("photon", metrics(2_000_000.0, 4_000, 500, 10_000)),
            ("trojan", metrics(1_000_000.0, 3_000, 300, 8_000)),
            ("bullx", metrics(1_000_000.0, 1_000, 100, 2_000)),
            ("axiom", metrics(0.0, 0, 0, 0)),
        ],
    )];

    out.push(snapshot(
        d(2025, 2, 27),
        &[("trojan", metrics(100.0, 10, 1, 2)), ("photon", volume_only(50.0))],
    ));
    out.push(snapshot(
        d(2025, 2, 28),
        &[("trojan", metrics(100.0, 10, 1, 2))],
    ));
    out.push(snapshot(d(2025, 3, 1), &[("photon", volume_only(70.0))]));
    out.push(snapshot(
        d(2025, 3, 2),
        &[("trojan", metrics(300.0, 30, 3, 6))],
    ));
    out
}

/// Create a `Connection` backed by a temporary offline cache seeded with
/// [`sample_snapshots`].
///
/// Returns `(Connection, tempfile::TempDir)`. The caller must keep the `TempDir`
/// alive for the duration of the test so the cache directory is not deleted
/// prematurely.
pub fn setup_sample_db() -> (Connection, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let cache = offline_cache(tmp_dir.path());
    for snap in sample_snapshots() {
        cache.store_snapshot(&snap).unwrap();
    }
    let conn = Connection::new(cache, ProtocolCatalog::builtin()).unwrap();
    (conn, tmp_dir)
}

/// Seed `dir` with the sample date and 30 days of history for a full analysis.
///
/// photon trades 1,500,000 on each of the 7 days before the sample date and
/// 1,000,000 before that; trojan trades 2,000,000 daily for the week before.
pub fn seed_full_window(dir: &std::path::Path) -> CacheManager {
    let cache = offline_cache(dir);
    let date = sample_date();
    cache.store_snapshot(&sample_snapshots()[0]).unwrap();
    for offset in 1..=30u64 {
        let day = days_before(date, offset);
        let photon = if offset <= 7 { 1_500_000.0 } else { 1_000_000.0 };
        let mut rows = vec![("photon", metrics(photon, 3_800, 200, 9_000))];
        if offset <= 7 {
            rows.push(("trojan", metrics(2_000_000.0, 3_000, 100, 8_000)));
        }
        cache.store_snapshot(&snapshot(day, &rows)).unwrap();
    }
    cache
}

// ---------------------------------------------------------------------------
// Local backend stub
// ---------------------------------------------------------------------------

/// A one-thread HTTP server on localhost that answers every request with the
/// current `body` as JSON, or 404 while `body` is `None`.
pub struct StubBackend {
    pub base: String,
    hits: Arc<AtomicUsize>,
    body: Arc<Mutex<Option<String>>>,
}

impl StubBackend {
    pub fn not_found() -> Self {
        Self::start(None)
    }

    pub fn serving(body: serde_json::Value) -> Self {
        Self::start(Some(body.to_string()))
    }

    fn start(body: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let body = Arc::new(Mutex::new(body));

        let (counter, current) = (hits.clone(), body.clone());
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);
                counter.fetch_add(1, Ordering::SeqCst);
                let response = match current.lock().unwrap().as_deref() {
                    Some(json) => format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                        json.len(),
                        json
                    ),
                    None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\
                             Connection: close\r\n\r\n"
                        .to_string(),
                };
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self {
            base: format!("http://{}/api", addr),
            hits,
            body,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn set_body(&self, body: serde_json::Value) {
        *self.body.lock().unwrap() = Some(body.to_string());
    }

    /// An online cache manager rooted in `dir` that talks to this stub.
    pub fn cache(&self, dir: &std::path::Path) -> CacheManager {
        CacheManager::new(Some(dir.to_path_buf()), false, Duration::from_secs(5))
            .unwrap()
            .with_api_base(self.base.clone())
    }
}
