//! Window assembly and the full analysis pipeline over an in-memory fetcher.

mod common;

use common::{d, days_before, metrics, snapshot, volume_only};
use sol_analytics_sdk::insights::{InsightConfig, VOLUME_LEADER};
use sol_analytics_sdk::models::{AggregateTotals, ProtocolCatalog, ProtocolId};
use sol_analytics_sdk::{DailyAnalysis, InMemoryFetcher, MetricsWindow};

fn fetcher_with_history() -> InMemoryFetcher {
    let date = d(2025, 3, 14);
    let mut fetcher = InMemoryFetcher::new();
    fetcher.insert(snapshot(
        date,
        &[
            ("photon", metrics(2_000_000.0, 4_000, 400, 10_000)),
            ("trojan", metrics(500_000.0, 1_000, 100, 4_000)),
            ("axiom", metrics(0.0, 0, 0, 0)),
        ],
    ));
    for offset in 1..=30u64 {
        let mut rows = vec![("photon", volume_only(1_000_000.0))];
        // trojan only reported on three of the last seven days
        if [1, 3, 5].contains(&offset) {
            rows.push(("trojan", volume_only(400_000.0)));
        }
        fetcher.insert(snapshot(days_before(date, offset), &rows));
    }
    fetcher
}

#[test]
fn fetch_requests_current_day_and_history() {
    let mut fetcher = fetcher_with_history();
    let window = MetricsWindow::fetch(&mut fetcher, d(2025, 3, 14), 30).unwrap();
    assert_eq!(fetcher.requests(), 31);
    assert_eq!(window.history.len(), 30);
}

#[test]
fn history_only_counts_reported_days() {
    let mut fetcher = fetcher_with_history();
    let window = MetricsWindow::fetch(&mut fetcher, d(2025, 3, 14), 30).unwrap();
    let performances = window.performances();

    let ids: Vec<&str> = performances.iter().map(|p| p.protocol.as_str()).collect();
    assert_eq!(ids, vec!["axiom", "photon", "trojan"]);

    let photon = &performances[1];
    assert_eq!(photon.previous_7d.len(), 7);
    assert_eq!(photon.previous_30d.len(), 30);
    assert!((photon.trends.volume_1d - 1.0).abs() < 1e-9);

    let trojan = &performances[2];
    assert_eq!(trojan.previous_7d.len(), 3);
    assert_eq!(trojan.previous_30d.len(), 3);
    assert!(trojan.previous_day.is_some());
    assert!((trojan.trends.volume_7d - 0.25).abs() < 1e-9);
}

#[test]
fn from_parts_drops_future_history() {
    let date = d(2025, 3, 14);
    let window = MetricsWindow::from_parts(
        date,
        snapshot(date, &[("photon", volume_only(10.0))]),
        vec![
            snapshot(d(2025, 3, 13), &[("photon", volume_only(5.0))]),
            snapshot(d(2025, 3, 14), &[("photon", volume_only(99.0))]),
            snapshot(d(2025, 3, 15), &[("photon", volume_only(99.0))]),
        ],
    );
    assert_eq!(window.history.len(), 1);
    assert_eq!(window.performances()[0].previous_7d.len(), 1);
}

#[test]
fn totals_skip_zero_volume() {
    let mut fetcher = fetcher_with_history();
    let window = MetricsWindow::fetch(&mut fetcher, d(2025, 3, 14), 30).unwrap();
    let totals = AggregateTotals::from_performances(&window.performances());

    assert_eq!(totals.total_volume, 2_500_000.0);
    assert_eq!(totals.total_trades, 14_000);
    assert_eq!(totals.total_users, 5_000);
    assert_eq!(totals.total_new_users, 500);
}

#[test]
fn analysis_runs_pipeline() {
    let mut fetcher = fetcher_with_history();
    let window = MetricsWindow::fetch(&mut fetcher, d(2025, 3, 14), 30).unwrap();
    let catalog = ProtocolCatalog::builtin();
    let analysis = DailyAnalysis::from_window(&window, &catalog, &InsightConfig::default());

    assert_eq!(analysis.date, d(2025, 3, 14));
    assert_eq!(analysis.insights[0].title, VOLUME_LEADER);
    assert_eq!(analysis.insights[0].protocol, Some(ProtocolId::from("photon")));
    assert!(analysis.insights[0].description.starts_with("Photon"));

    assert_eq!(analysis.performance("trojan").unwrap().current.daily_trades, 4_000);
    assert!(analysis.performance("bloom").is_err());
}

#[test]
fn empty_day_yields_no_insights() {
    let mut fetcher = InMemoryFetcher::new();
    let window = MetricsWindow::fetch(&mut fetcher, d(2025, 3, 14), 30).unwrap();
    let analysis =
        DailyAnalysis::from_window(&window, &ProtocolCatalog::builtin(), &InsightConfig::default());
    assert!(analysis.performances.is_empty());
    assert!(analysis.insights.is_empty());
}
