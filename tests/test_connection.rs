//! Connection integration tests: snapshot loading, raw SQL execution.

mod common;

use common::{d, sample_date, setup_sample_db, snapshot, volume_only};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Snapshot loading
// ---------------------------------------------------------------------------

#[test]
fn dates_load_lazily() {
    let (conn, _tmp) = setup_sample_db();
    assert!(conn.loaded_dates().is_empty());

    conn.ensure_dates(&[sample_date()]).unwrap();
    assert!(conn.has_date(sample_date()));
    assert_eq!(conn.loaded_dates(), vec![sample_date()]);
}

#[test]
fn loaded_rows_carry_catalog_metadata() {
    let (conn, _tmp) = setup_sample_db();
    conn.ensure_dates(&[sample_date()]).unwrap();

    let rows = conn
        .execute(
            "SELECT protocol, name, category, chain FROM daily_metrics ORDER BY protocol",
            &[],
        )
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["protocol"], "axiom");
    assert_eq!(rows[3]["protocol"], "trojan");
    assert_eq!(rows[3]["name"], "Trojan");
    assert_eq!(rows[3]["category"], "Telegram Bots");
    assert_eq!(rows[3]["chain"], "solana");
}

#[test]
fn unknown_protocol_falls_into_other() {
    let (conn, _tmp) = setup_sample_db();
    let day = d(2025, 4, 1);
    conn.load_snapshot(&snapshot(day, &[("newbot", volume_only(10.0))]))
        .unwrap();

    let rows = conn
        .execute("SELECT name, category FROM daily_metrics", &[])
        .unwrap();
    assert_eq!(rows[0]["name"], "newbot");
    assert_eq!(rows[0]["category"], "Other");
}

#[test]
fn load_snapshot_replaces_existing_date() {
    let (conn, _tmp) = setup_sample_db();
    let day = d(2025, 4, 1);
    conn.load_snapshot(&snapshot(day, &[("trojan", volume_only(10.0)), ("bullx", volume_only(5.0))]))
        .unwrap();
    let written = conn
        .load_snapshot(&snapshot(day, &[("trojan", volume_only(20.0))]))
        .unwrap();
    assert_eq!(written, 1);

    let count = conn
        .execute_scalar("SELECT COUNT(*) FROM daily_metrics", &[])
        .unwrap();
    assert_eq!(count, Some(serde_json::json!(1)));
}

#[test]
fn missing_offline_date_is_not_found() {
    let (conn, _tmp) = setup_sample_db();
    let err = conn.ensure_dates(&[d(2020, 1, 1)]).unwrap_err();
    assert!(matches!(err, sol_analytics_sdk::AnalyticsError::NotFound(_)));
    assert!(!conn.has_date(d(2020, 1, 1)));
}

#[test]
fn ensure_range_rejects_inverted_range() {
    let (conn, _tmp) = setup_sample_db();
    assert!(conn.ensure_range(d(2025, 3, 2), d(2025, 2, 27)).is_err());
}

#[test]
fn reset_unloads_all_dates() {
    let (conn, _tmp) = setup_sample_db();
    conn.ensure_dates(&[sample_date()]).unwrap();
    conn.reset().unwrap();
    assert!(conn.loaded_dates().is_empty());
    let count = conn
        .execute_scalar("SELECT COUNT(*) FROM daily_metrics", &[])
        .unwrap();
    assert_eq!(count, Some(serde_json::json!(0)));
}

// ---------------------------------------------------------------------------
// execute / execute_scalar / execute_into
// ---------------------------------------------------------------------------

#[test]
fn execute_with_params() {
    let (conn, _tmp) = setup_sample_db();
    conn.ensure_dates(&[sample_date()]).unwrap();

    let rows = conn
        .execute(
            "SELECT protocol FROM daily_metrics WHERE category = ? ORDER BY protocol",
            &["Trading Terminals".to_string()],
        )
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["protocol"], "axiom");
}

#[test]
fn execute_returns_dates_as_iso_strings() {
    let (conn, _tmp) = setup_sample_db();
    conn.ensure_dates(&[sample_date()]).unwrap();

    let value = conn
        .execute_scalar("SELECT MAX(date) FROM daily_metrics", &[])
        .unwrap();
    assert_eq!(value, Some(serde_json::json!("2025-03-14")));
}

#[test]
fn execute_scalar_returns_none_for_empty_result() {
    let (conn, _tmp) = setup_sample_db();
    let value = conn
        .execute_scalar("SELECT protocol FROM daily_metrics WHERE FALSE", &[])
        .unwrap();
    assert!(value.is_none());
}

#[test]
fn hugeint_sums_convert_to_numbers() {
    let (conn, _tmp) = setup_sample_db();
    conn.ensure_dates(&[sample_date()]).unwrap();

    let value = conn
        .execute_scalar("SELECT SUM(daily_trades) FROM daily_metrics", &[])
        .unwrap();
    assert_eq!(value, Some(serde_json::json!(20_000)));
}

#[test]
fn execute_into_deserializes_rows() {
    #[derive(Deserialize)]
    struct Row {
        protocol: String,
        total_volume_usd: f64,
    }

    let (conn, _tmp) = setup_sample_db();
    conn.ensure_dates(&[sample_date()]).unwrap();

    let rows: Vec<Row> = conn
        .execute_into(
            "SELECT protocol, total_volume_usd FROM daily_metrics ORDER BY total_volume_usd DESC, protocol LIMIT 1",
            &[],
        )
        .unwrap();
    assert_eq!(rows[0].protocol, "photon");
    assert_eq!(rows[0].total_volume_usd, 2_000_000.0);
}

#[test]
fn invalid_sql_is_an_error() {
    let (conn, _tmp) = setup_sample_db();
    assert!(conn.execute("SELECT * FROM no_such_table", &[]).is_err());
}
