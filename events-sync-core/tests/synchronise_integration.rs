use chrono::NaiveDate;
use mockall::predicate::eq;
use mockall::Sequence;
use serde_json::json;

use events_sync_core::config::{KeyMatching, SyncSettings};
use events_sync_core::contract::{MockEventSource, MockEventStore, PageRequest};
use events_sync_core::error::{FetchError, SyncError};
use events_sync_core::memory::MemoryEventStore;
use events_sync_core::normalize::StoredEvent;
use events_sync_core::paginate::fetch_and_save_all;
use events_sync_core::record::{EventPage, ExternalEventRecord};
use events_sync_core::synchronise::{synchronise, synchronise_on};

const BASELINE: &str = "2024-03-10T00:00:00+00:00";

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Builds `count` distinct records numbered from `first`.
fn records(first: usize, count: usize) -> Vec<ExternalEventRecord> {
    (first..first + count)
        .map(|i| {
            serde_json::from_value(json!({
                "subject": format!("Event {i}"),
                "location": "City Hall",
                "start_datetime": format!("2024-03-{:02}T10:00:00+00:00", 10 + i % 15),
                "event_type": ["Free", "Family"],
                "web_link": format!("https://example.org/book?eventid%3d{}", 1000 + i),
            }))
            .expect("valid record")
        })
        .collect()
}

fn page(total_count: u64, results: Vec<ExternalEventRecord>) -> EventPage {
    EventPage {
        total_count,
        results,
    }
}

fn request(offset: u64) -> PageRequest {
    PageRequest {
        since: Some(BASELINE.to_string()),
        limit: 100,
        offset,
    }
}

#[tokio::test]
async fn total_250_takes_exactly_three_fetches() {
    let mut source = MockEventSource::new();
    let mut seq = Sequence::new();

    for (offset, first, count) in [(0u64, 0usize, 100usize), (100, 100, 100), (200, 200, 50)] {
        source
            .expect_fetch_page()
            .with(eq(request(offset)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(page(250, records(first, count))));
    }

    let store = MemoryEventStore::new();
    let saved = fetch_and_save_all(&source, &store, &SyncSettings::default(), BASELINE)
        .await
        .expect("pagination should succeed");

    assert_eq!(saved, 250);
    assert_eq!(store.len(), 250);
}

#[tokio::test]
async fn empty_page_ends_the_loop_early() {
    let mut source = MockEventSource::new();
    let mut seq = Sequence::new();

    source
        .expect_fetch_page()
        .with(eq(request(0)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(page(500, records(0, 100))));
    source
        .expect_fetch_page()
        .with(eq(request(100)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(page(500, vec![])));

    let store = MemoryEventStore::new();
    let saved = fetch_and_save_all(&source, &store, &SyncSettings::default(), BASELINE)
        .await
        .expect("pagination should stop cleanly");

    assert_eq!(saved, 100);
}

#[tokio::test]
async fn no_matching_events_is_a_single_fetch() {
    let mut source = MockEventSource::new();
    source
        .expect_fetch_page()
        .times(1)
        .returning(|_| Ok(page(0, vec![])));

    let mut store = MockEventStore::new();
    store.expect_count_by_natural_key().never();
    store.expect_insert_event().never();

    let saved = fetch_and_save_all(&source, &store, &SyncSettings::default(), BASELINE)
        .await
        .unwrap();
    assert_eq!(saved, 0);
}

#[tokio::test]
async fn upstream_error_aborts_but_keeps_earlier_pages() {
    let mut source = MockEventSource::new();
    let mut seq = Sequence::new();

    source
        .expect_fetch_page()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(page(300, records(0, 100))));
    source
        .expect_fetch_page()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Err(FetchError::Status {
                status: 500,
                body: "internal error".into(),
            })
        });

    let store = MemoryEventStore::new();
    let err = fetch_and_save_all(&source, &store, &SyncSettings::default(), BASELINE)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500, .. }));
    assert!(err.to_string().contains("internal error"));
    assert_eq!(store.len(), 100, "rows from the first page stay committed");
}

#[tokio::test]
async fn custom_page_size_drives_offsets() {
    let mut source = MockEventSource::new();
    let mut seq = Sequence::new();
    for (offset, first, count) in [(0u64, 0usize, 2usize), (2, 2, 1)] {
        source
            .expect_fetch_page()
            .with(eq(PageRequest {
                since: Some(BASELINE.to_string()),
                limit: 2,
                offset,
            }))
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(page(3, records(first, count))));
    }

    let settings = SyncSettings {
        page_size: 2,
        batch_size: 1,
        key_matching: KeyMatching::NullSafe,
    };
    let store = MemoryEventStore::new();
    let saved = fetch_and_save_all(&source, &store, &settings, BASELINE).await.unwrap();
    assert_eq!(saved, 3);
}

#[tokio::test]
async fn synchronise_uses_latest_stored_start_as_baseline() {
    let existing = StoredEvent {
        subject: Some("Older".into()),
        start_datetime: Some("2024-03-10T14:00:00+00:00".into()),
        slug: "older-unknown".into(),
        ..Default::default()
    };
    let store = MemoryEventStore::with_events(vec![existing]);

    let mut source = MockEventSource::new();
    source
        .expect_fetch_page()
        .with(eq(request(0)))
        .times(1)
        .returning(|_| Ok(page(2, records(0, 2))));

    let report = synchronise_on(&source, &store, &SyncSettings::default(), day(2030, 1, 1))
        .await
        .expect("sync should succeed");

    assert!(report.success);
    assert_eq!(report.count, 2);
    assert_eq!(report.message, "Successfully synced 2 events");
}

#[tokio::test]
async fn synchronise_on_empty_store_starts_from_today() {
    let store = MemoryEventStore::new();

    let mut source = MockEventSource::new();
    source
        .expect_fetch_page()
        .withf(|req| req.since.as_deref() == Some("2025-11-02T00:00:00+00:00") && req.offset == 0)
        .times(1)
        .returning(|_| Ok(page(0, vec![])));

    let report = synchronise_on(&source, &store, &SyncSettings::default(), day(2025, 11, 2))
        .await
        .unwrap();
    assert_eq!(report.count, 0);
}

#[tokio::test]
async fn running_twice_inserts_nothing_new() {
    let store = MemoryEventStore::new();

    let mut source = MockEventSource::new();
    source
        .expect_fetch_page()
        .times(2)
        .returning(|_| Ok(page(30, records(0, 30))));

    let first = synchronise(&source, &store, &SyncSettings::default()).await.unwrap();
    let second = synchronise(&source, &store, &SyncSettings::default()).await.unwrap();

    assert_eq!(first.count, 30);
    assert_eq!(second.count, 0);
    assert_eq!(store.len(), 30);
}

#[tokio::test]
async fn failing_baseline_query_is_fatal() {
    let mut store = MockEventStore::new();
    store
        .expect_latest_start_datetime()
        .times(1)
        .returning(|| Err("no such table: events".into()));

    let mut source = MockEventSource::new();
    source.expect_fetch_page().never();

    let err = synchronise(&source, &store, &SyncSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Store(_)));
    assert!(err.to_string().contains("no such table"));
}

#[tokio::test]
async fn upstream_failure_surfaces_from_synchronise() {
    let store = MemoryEventStore::new();
    let mut source = MockEventSource::new();
    source.expect_fetch_page().times(1).returning(|_| {
        Err(FetchError::Status {
            status: 404,
            body: "dataset not found".into(),
        })
    });

    let err = synchronise(&source, &store, &SyncSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Upstream(FetchError::Status { status: 404, .. })));
}
