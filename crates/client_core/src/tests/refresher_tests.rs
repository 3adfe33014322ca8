use super::*;
use crate::test_support::{email, snapshot, unavailable};
use chrono::TimeZone;
use shared::domain::{Category, EmailId};

fn at(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, secs)
        .single()
        .expect("valid timestamp")
}

#[test]
fn first_tick_issues_and_success_goes_live() {
    let mut refresher = SnapshotRefresher::new();
    let mut store = SnapshotStore::new();
    assert_eq!(refresher.connectivity(), Connectivity::Live);

    let ticket = refresher.begin_tick().expect("first tick fetches");
    let outcome = refresher.settle(
        &mut store,
        ticket,
        Ok(snapshot(vec![email("u1", "Ops", Category::Urgent)], "sync-1")),
        at(1),
    );

    assert_eq!(outcome, RefreshOutcome::Applied);
    assert_eq!(store.last_sync(), Some("sync-1"));
    assert_eq!(refresher.last_synced_at(), Some(at(1)));
    assert_eq!(refresher.in_flight(), 0);
}

#[test]
fn tick_is_skipped_while_fetch_in_flight() {
    let mut refresher = SnapshotRefresher::new();
    let mut store = SnapshotStore::new();

    let ticket = refresher.begin_tick().expect("first tick");
    assert!(refresher.begin_tick().is_none());

    refresher.settle(&mut store, ticket, Ok(snapshot(vec![], "s")), at(1));
    assert!(refresher.begin_tick().is_some());
}

#[test]
fn manual_refresh_issues_even_while_in_flight() {
    let mut refresher = SnapshotRefresher::new();

    let first = refresher.begin_tick().expect("tick");
    let second = refresher.begin_manual();

    assert!(second.sequence() > first.sequence());
    assert_eq!(refresher.in_flight(), 2);
}

#[test]
fn older_response_arriving_last_is_discarded() {
    let mut refresher = SnapshotRefresher::new();
    let mut store = SnapshotStore::new();

    let r1 = refresher.begin_tick().expect("tick");
    let r2 = refresher.begin_manual();

    let newer = refresher.settle(
        &mut store,
        r2,
        Ok(snapshot(vec![email("b", "B", Category::Info)], "B")),
        at(2),
    );
    let older = refresher.settle(
        &mut store,
        r1,
        Ok(snapshot(vec![email("a", "A", Category::Info)], "A")),
        at(3),
    );

    assert_eq!(newer, RefreshOutcome::Applied);
    assert_eq!(older, RefreshOutcome::Stale);
    assert_eq!(store.last_sync(), Some("B"));
    assert!(store.find(&EmailId::new("b")).is_some());
    assert!(store.find(&EmailId::new("a")).is_none());
    assert_eq!(refresher.last_synced_at(), Some(at(2)));
    assert_eq!(refresher.in_flight(), 0);
}

#[test]
fn failure_keeps_previous_snapshot_and_goes_offline() {
    let mut refresher = SnapshotRefresher::new();
    let mut store = SnapshotStore::new();
    let ticket = refresher.begin_tick().expect("tick");
    refresher.settle(
        &mut store,
        ticket,
        Ok(snapshot(vec![email("u1", "Ops", Category::Urgent)], "sync-1")),
        at(1),
    );

    let ticket = refresher.begin_tick().expect("tick");
    let outcome = refresher.settle(&mut store, ticket, Err(unavailable("/api/emails")), at(31));

    assert_eq!(outcome, RefreshOutcome::Offline);
    assert_eq!(refresher.connectivity(), Connectivity::Offline);
    assert_eq!(store.last_sync(), Some("sync-1"));
    assert_eq!(store.list(Category::Urgent).len(), 1);
    assert_eq!(refresher.last_synced_at(), Some(at(1)));
}

#[test]
fn next_success_after_failure_goes_live_again() {
    let mut refresher = SnapshotRefresher::new();
    let mut store = SnapshotStore::new();

    let ticket = refresher.begin_tick().expect("tick");
    refresher.settle(&mut store, ticket, Err(unavailable("/api/emails")), at(1));
    assert_eq!(refresher.connectivity(), Connectivity::Offline);
    assert!(store.displayed().is_none());

    let ticket = refresher.begin_tick().expect("tick");
    refresher.settle(&mut store, ticket, Ok(snapshot(vec![], "sync-2")), at(31));

    assert_eq!(refresher.connectivity(), Connectivity::Live);
    assert_eq!(store.last_sync(), Some("sync-2"));
}

#[test]
fn stale_failure_does_not_flip_indicator() {
    let mut refresher = SnapshotRefresher::new();
    let mut store = SnapshotStore::new();

    let r1 = refresher.begin_tick().expect("tick");
    let r2 = refresher.begin_manual();
    refresher.settle(&mut store, r2, Ok(snapshot(vec![], "B")), at(2));
    let outcome = refresher.settle(&mut store, r1, Err(unavailable("/api/emails")), at(3));

    assert_eq!(outcome, RefreshOutcome::Stale);
    assert_eq!(refresher.connectivity(), Connectivity::Live);
}

#[test]
fn fetch_discards_optimistic_removals() {
    let mut refresher = SnapshotRefresher::new();
    let mut store = SnapshotStore::new();
    let fetched = snapshot(
        vec![
            email("u1", "Ops", Category::Urgent),
            email("u2", "Alice", Category::Urgent),
        ],
        "sync-1",
    );

    let ticket = refresher.begin_tick().expect("tick");
    refresher.settle(&mut store, ticket, Ok(fetched.clone()), at(1));
    store.remove(&EmailId::new("u1")).expect("present");
    assert_eq!(store.list(Category::Urgent).len(), 1);

    let ticket = refresher.begin_manual();
    refresher.settle(&mut store, ticket, Ok(fetched), at(2));

    assert_eq!(store.list(Category::Urgent).len(), 2);
}
