//! Insert-if-absent for normalised events.
//!
//! Each record is checked against the store by its natural key and inserted
//! only when no row matches. Nothing is ever updated. Records are handled
//! strictly one after another, so two records sharing a key within one page
//! cannot both pass the check.

use tracing::{debug, error, info};

use crate::config::KeyMatching;
use crate::contract::EventStore;
use crate::error::StoreError;
use crate::normalize::{normalize, StoredEvent};
use crate::record::ExternalEventRecord;

/// What happened to one candidate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

impl InsertOutcome {
    pub fn inserted(self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// Checks the natural key and inserts the row when it is absent.
pub async fn try_insert<S>(
    store: &S,
    candidate: &StoredEvent,
    matching: KeyMatching,
) -> Result<InsertOutcome, StoreError>
where
    S: EventStore + ?Sized,
{
    let key = candidate.natural_key();
    let existing = store.count_by_natural_key(&key, matching).await?;
    if existing > 0 {
        return Ok(InsertOutcome::AlreadyPresent);
    }
    store.insert_event(candidate).await?;
    Ok(InsertOutcome::Inserted)
}

/// Normalises and saves one page of upstream records in batches of `batch_size`.
///
/// A failure on one record is logged and skipped. Returns the number of rows
/// actually inserted.
pub async fn save_events<S>(
    store: &S,
    records: &[ExternalEventRecord],
    batch_size: usize,
    matching: KeyMatching,
) -> usize
where
    S: EventStore + ?Sized,
{
    let mut saved = 0;

    for (batch_index, batch) in records.chunks(batch_size.max(1)).enumerate() {
        let candidates: Vec<StoredEvent> = batch.iter().map(normalize).collect();
        debug!(batch_index, size = candidates.len(), "[SAVE] Prepared batch");

        for event in &candidates {
            match try_insert(store, event, matching).await {
                Ok(InsertOutcome::Inserted) => {
                    saved += 1;
                    info!(
                        subject = event.subject.as_deref().unwrap_or_default(),
                        location = event.location.as_deref().unwrap_or_default(),
                        start_datetime = event.start_datetime.as_deref().unwrap_or_default(),
                        slug = %event.slug,
                        "[SAVE] Saved event"
                    );
                }
                Ok(InsertOutcome::AlreadyPresent) => {
                    debug!(
                        subject = event.subject.as_deref().unwrap_or_default(),
                        location = event.location.as_deref().unwrap_or_default(),
                        start_datetime = event.start_datetime.as_deref().unwrap_or_default(),
                        "[SAVE] Event already exists"
                    );
                }
                Err(e) => {
                    error!(
                        subject = event.subject.as_deref().unwrap_or_default(),
                        error = %e,
                        "[SAVE][ERROR] Error saving event"
                    );
                }
            }
        }
    }

    saved
}
