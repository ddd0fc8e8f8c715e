//! # contract: the seams between the sync pipeline and the outside world
//!
//! Two traits, both async and both annotated for `mockall`:
//! - [`EventSource`] fetches one page of upstream records.
//! - [`EventStore`] is the persisted `events` table, reduced to the three
//!   statements the pipeline needs (latest start, natural-key count, insert).
//!
//! Production code passes concrete implementations ([`crate::fetch::HttpEventSource`]
//! and the SQLite store in the `events-sync` binary crate) into
//! [`crate::synchronise::synchronise`]; tests pass the generated
//! `MockEventSource` / `MockEventStore`, exported under the `test-export-mocks`
//! feature so downstream crates can use them too.

use async_trait::async_trait;

use mockall::automock;

use crate::config::KeyMatching;
use crate::error::{FetchError, StoreError};
use crate::normalize::{NaturalKey, StoredEvent};
use crate::record::EventPage;

/// One request against the upstream `records` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Lower bound for `start_datetime` (ISO-8601). `None` fetches unfiltered
    /// and unordered, which is only used for health probes.
    pub since: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// Trait for fetching pages of events from the upstream API.
/// Allows plugging in the real HTTP client or a mock.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch a single page. Non-success responses and undecodable bodies are errors.
    async fn fetch_page(&self, request: &PageRequest) -> Result<EventPage, FetchError>;
}

/// Trait for the persisted event store.
///
/// Implementors run each call as its own statement; the pipeline never holds a
/// transaction open across calls.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// `start_datetime` of the most recently inserted row (highest `event_id`),
    /// or `None` when the table is empty or that row has no start time.
    async fn latest_start_datetime(&self) -> Result<Option<String>, StoreError>;

    /// Number of rows whose natural key equals `key` under `matching`.
    async fn count_by_natural_key(
        &self,
        key: &NaturalKey,
        matching: KeyMatching,
    ) -> Result<u64, StoreError>;

    /// Append one row. Never updates an existing one.
    async fn insert_event(&self, event: &StoredEvent) -> Result<(), StoreError>;
}
