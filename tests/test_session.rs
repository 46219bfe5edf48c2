//! Stale-analysis discard.

mod common;

use std::thread;

use common::d;
use sol_analytics_sdk::session::AnalysisSession;
use sol_analytics_sdk::AnalyticsError;

#[test]
fn latest_ticket_wins() {
    let session = AnalysisSession::new();
    let first = session.begin(d(2025, 3, 13));
    let second = session.begin(d(2025, 3, 14));

    assert!(!session.is_current(&first));
    assert!(session.is_current(&second));
    assert_eq!(session.latest_date(), Some(d(2025, 3, 14)));

    match session.finish(first, "old") {
        Err(AnalyticsError::Superseded { requested, current }) => {
            assert_eq!(requested, d(2025, 3, 13));
            assert_eq!(current, d(2025, 3, 14));
        }
        other => panic!("expected Superseded, got {:?}", other),
    }
    assert_eq!(session.finish(second, "new").unwrap(), "new");
}

#[test]
fn superseded_is_flagged() {
    let session = AnalysisSession::new();
    let stale = session.begin(d(2025, 3, 13));
    session.begin(d(2025, 3, 13));
    let err = session.finish(stale, ()).unwrap_err();
    assert!(err.is_superseded());
}

#[test]
fn clones_share_generation_across_threads() {
    let session = AnalysisSession::new();
    let ticket = session.begin(d(2025, 3, 1));

    let other = session.clone();
    thread::spawn(move || {
        other.begin(d(2025, 3, 2));
    })
    .join()
    .unwrap();

    assert!(session.finish(ticket, 1).is_err());
    assert_eq!(session.latest_date(), Some(d(2025, 3, 2)));
}
