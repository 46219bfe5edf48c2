//! Smoke test against a running analytics backend.
//!
//! Uses `SOL_ANALYTICS_API_URL` (default `http://localhost:3001/api`) and a
//! throwaway cache directory, then exercises every public SDK surface for
//! the day before yesterday.
//!
//! Run with:
//! ```sh
//! cargo test --test smoke_test -- --ignored --nocapture
//! ```

use chrono::{Days, Utc};
use sol_analytics_sdk::columns::MetricKey;
use sol_analytics_sdk::models::{Layout, Period};
use sol_analytics_sdk::SolAnalyticsSdk;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Print a section header to stderr.
fn section(name: &str) {
    eprintln!("\n{}", "=".repeat(60));
    eprintln!("  {}", name);
    eprintln!("{}", "=".repeat(60));
}

/// Counters for pass/fail reporting.
struct Counters {
    pass: usize,
    fail: usize,
}

impl Counters {
    fn new() -> Self {
        Self { pass: 0, fail: 0 }
    }

    fn check(&mut self, label: &str, condition: bool, detail: &str) {
        let status = if condition { "PASS" } else { "FAIL" };
        if condition {
            self.pass += 1;
        } else {
            self.fail += 1;
        }
        if detail.is_empty() {
            eprintln!("  [{}] {}", status, label);
        } else {
            eprintln!("  [{}] {} -- {}", status, label, detail);
        }
    }
}

// ---------------------------------------------------------------------------
// Main smoke test
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn smoke_test() {
    let tmp = tempfile::tempdir().unwrap();
    let sdk = SolAnalyticsSdk::builder()
        .cache_dir(tmp.path().join("cache"))
        .preferences_path(tmp.path().join("prefs.json"))
        .build()
        .unwrap();
    let mut c = Counters::new();
    let date = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(2))
        .unwrap();

    section("Raw metrics");

    let snapshot = sdk.metrics().daily(date).unwrap();
    c.check(
        "daily snapshot",
        true,
        &format!("{} protocols on {}", snapshot.protocols.len(), date),
    );
    let optimized = sdk.metrics().optimized(date);
    c.check(
        "optimized endpoint",
        optimized.is_ok(),
        &format!("{:?}", optimized.as_ref().map(|m| m.len())),
    );

    section("Insights");

    let analysis = sdk.analyze(date).unwrap();
    c.check(
        "analyze",
        analysis.performances.len() == snapshot.protocols.len(),
        &format!("{} insights", analysis.insights.len()),
    );
    let compact = sdk.daily_insights(date, Layout::Compact).unwrap();
    c.check("compact <= 4", compact.len() <= 4, "");
    for insight in &compact {
        eprintln!("    {:?} {} -- {}", insight.kind, insight.title, insight.description);
    }

    section("Tables");

    let ranked = sdk.tables().ranked(date, MetricKey::TotalVolume).unwrap();
    c.check(
        "ranked by volume",
        ranked.windows(2).all(|w| w[0].value >= w[1].value),
        &format!("{} rows", ranked.len()),
    );
    let categories = sdk.tables().category_totals(date).unwrap();
    let share: f64 = categories.iter().map(|c| c.market_share).sum();
    c.check(
        "category shares sum to 1",
        categories.is_empty() || (share - 1.0).abs() < 1e-6,
        &format!("{} categories", categories.len()),
    );
    if let Some(top) = ranked.first() {
        let from = date.checked_sub_days(Days::new(13)).unwrap();
        let weeks = sdk
            .tables()
            .period_totals(&top.protocol, from, date, Period::Week)
            .unwrap();
        c.check("weekly roll-up", !weeks.is_empty(), &top.protocol);
    }

    section("Display & Close");

    let display = format!("{}", sdk);
    c.check("Display impl", display.contains("SolAnalyticsSdk"), &display);
    sdk.close();

    section("SMOKE TEST COMPLETE");

    eprintln!("  Passed:  {}", c.pass);
    eprintln!("  Failed:  {}", c.fail);

    assert_eq!(c.fail, 0, "{} smoke test checks failed", c.fail);
}
