//! An in-process [`EventStore`] backed by a `Vec`, for tests and dry runs.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::config::KeyMatching;
use crate::contract::EventStore;
use crate::error::StoreError;
use crate::normalize::{NaturalKey, StoredEvent};

#[derive(Debug, Default)]
pub struct MemoryEventStore {
    rows: Mutex<Vec<StoredEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<StoredEvent>) -> Self {
        Self {
            rows: Mutex::new(events),
        }
    }

    /// Snapshot of all rows in insertion order.
    pub fn events(&self) -> Vec<StoredEvent> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn component_matches(stored: &Option<String>, wanted: &Option<String>, matching: KeyMatching) -> bool {
    match matching {
        KeyMatching::NullSafe => stored == wanted,
        KeyMatching::Strict => matches!((stored, wanted), (Some(a), Some(b)) if a == b),
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn latest_start_datetime(&self) -> Result<Option<String>, StoreError> {
        let rows = self.rows.lock().map_err(|e| e.to_string())?;
        Ok(rows.last().and_then(|e| e.start_datetime.clone()))
    }

    async fn count_by_natural_key(
        &self,
        key: &NaturalKey,
        matching: KeyMatching,
    ) -> Result<u64, StoreError> {
        let rows = self.rows.lock().map_err(|e| e.to_string())?;
        let count = rows
            .iter()
            .filter(|e| {
                component_matches(&e.subject, &key.subject, matching)
                    && component_matches(&e.location, &key.location, matching)
                    && component_matches(&e.start_datetime, &key.start_datetime, matching)
            })
            .count();
        Ok(count as u64)
    }

    async fn insert_event(&self, event: &StoredEvent) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().map_err(|e| e.to_string())?;
        rows.push(event.clone());
        Ok(())
    }
}
