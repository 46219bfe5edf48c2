//! Unit tests for the SqlBuilder query construction.

use chrono::NaiveDate;
use sol_analytics_sdk::SqlBuilder;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ---------------------------------------------------------------------------
// Basic construction
// ---------------------------------------------------------------------------

#[test]
fn new_creates_select_star_from_table() {
    let (sql, params) = SqlBuilder::new("daily_metrics").build();
    assert_eq!(sql, "SELECT *\nFROM daily_metrics");
    assert!(params.is_empty());
}

#[test]
fn select_replaces_default_star() {
    let (sql, _) = SqlBuilder::new("daily_metrics")
        .select(&["protocol", "total_volume_usd"])
        .build();
    assert!(sql.starts_with("SELECT protocol, total_volume_usd\n"));
}

// ---------------------------------------------------------------------------
// WHERE conditions
// ---------------------------------------------------------------------------

#[test]
fn where_eq_adds_equality_with_param() {
    let (sql, params) = SqlBuilder::new("daily_metrics")
        .where_eq("protocol", "photon")
        .build();
    assert!(sql.contains("WHERE protocol = ?"));
    assert_eq!(params, vec!["photon"]);
}

#[test]
fn where_in_adds_in_clause() {
    let (sql, params) = SqlBuilder::new("daily_metrics")
        .where_in("protocol", &["axiom", "bullx", "photon"])
        .build();
    assert!(sql.contains("protocol IN (?, ?, ?)"));
    assert_eq!(params, vec!["axiom", "bullx", "photon"]);
}

#[test]
fn where_in_empty_produces_false() {
    let (sql, params) = SqlBuilder::new("daily_metrics")
        .where_in("protocol", &[])
        .build();
    assert!(sql.contains("WHERE FALSE"));
    assert!(params.is_empty());
}

#[test]
fn where_date_binds_iso_string() {
    let (sql, params) = SqlBuilder::new("daily_metrics")
        .where_date("date", d(2025, 3, 14))
        .build();
    assert!(sql.contains("date = CAST(? AS DATE)"));
    assert_eq!(params, vec!["2025-03-14"]);
}

#[test]
fn where_date_between_binds_both_ends() {
    let (sql, params) = SqlBuilder::new("daily_metrics")
        .where_date_between("date", d(2025, 2, 1), d(2025, 2, 28))
        .build();
    assert!(sql.contains("date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)"));
    assert_eq!(params, vec!["2025-02-01", "2025-02-28"]);
}

#[test]
fn where_positive_takes_no_params() {
    let (sql, params) = SqlBuilder::new("daily_metrics")
        .where_positive("daily_users")
        .build();
    assert!(sql.contains("WHERE daily_users > 0"));
    assert!(params.is_empty());
}

#[test]
fn where_clause_appends_params_in_order() {
    let (sql, params) = SqlBuilder::new("daily_metrics")
        .where_eq("chain", "solana")
        .where_clause("total_volume_usd >= CAST(? AS DOUBLE)", &["500000"])
        .build();
    assert!(sql.contains("chain = ?"));
    assert!(sql.contains("total_volume_usd >= CAST(? AS DOUBLE)"));
    assert_eq!(params, vec!["solana", "500000"]);
}

// ---------------------------------------------------------------------------
// GROUP BY / HAVING
// ---------------------------------------------------------------------------

#[test]
fn group_by_adds_clause() {
    let (sql, _) = SqlBuilder::new("daily_metrics")
        .select(&["category", "COUNT(*) AS protocols"])
        .group_by(&["category"])
        .build();
    assert!(sql.contains("GROUP BY category"));
}

#[test]
fn having_params_ordered_after_where_params() {
    let (sql, params) = SqlBuilder::new("daily_metrics")
        .select(&["category", "SUM(total_volume_usd) AS volume"])
        .where_date("date", d(2025, 3, 14))
        .group_by(&["category"])
        .having("SUM(total_volume_usd) > CAST(? AS DOUBLE)", &["1000000"])
        .build();
    assert!(sql.contains("HAVING SUM(total_volume_usd) > CAST(? AS DOUBLE)"));
    assert_eq!(params, vec!["2025-03-14", "1000000"]);
}

// ---------------------------------------------------------------------------
// ORDER BY / LIMIT / OFFSET
// ---------------------------------------------------------------------------

#[test]
fn order_by_adds_clause() {
    let (sql, _) = SqlBuilder::new("daily_metrics")
        .order_by(&["total_volume_usd DESC", "protocol ASC"])
        .build();
    assert!(sql.contains("ORDER BY total_volume_usd DESC, protocol ASC"));
}

#[test]
fn limit_and_offset_together() {
    let (sql, _) = SqlBuilder::new("daily_metrics")
        .limit(10)
        .offset(20)
        .build();
    assert!(sql.contains("LIMIT 10"));
    assert!(sql.contains("OFFSET 20"));
}

// ---------------------------------------------------------------------------
// Combined / chained
// ---------------------------------------------------------------------------

#[test]
fn multiple_where_clauses_joined_with_and() {
    let (sql, params) = SqlBuilder::new("daily_metrics")
        .where_eq("protocol", "trojan")
        .where_date_between("date", d(2025, 1, 1), d(2025, 1, 31))
        .where_positive("total_volume_usd")
        .build();
    assert!(sql.contains(
        "WHERE protocol = ? AND date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE) AND total_volume_usd > 0"
    ));
    assert_eq!(params, vec!["trojan", "2025-01-01", "2025-01-31"]);
}

#[test]
fn full_query_clause_order() {
    let (sql, _) = SqlBuilder::new("daily_metrics")
        .select(&["category", "COUNT(*) AS n"])
        .where_positive("daily_trades")
        .group_by(&["category"])
        .order_by(&["n DESC"])
        .limit(5)
        .build();

    assert_eq!(
        sql,
        "SELECT category, COUNT(*) AS n\nFROM daily_metrics\nWHERE daily_trades > 0\nGROUP BY category\nORDER BY n DESC\nLIMIT 5"
    );
}
