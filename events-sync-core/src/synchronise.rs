//! High-level pipeline: baseline → paginated fetch → dedup-insert.
//!
//! This module provides the top-level orchestration for one "sync" of the
//! upstream events feed into the store. A run:
//!   - Reads the start time of the most recently stored event and truncates it
//!     to midnight UTC, giving the baseline (today, when nothing is stored yet)
//!   - Fetches every upstream page with `start_datetime >= baseline`
//!   - Normalises each record and inserts the ones whose natural key is new
//!   - Returns a [`SyncReport`] with the number of rows inserted
//!
//! # Callable From
//! - The CLI crate (`sync`, `watch`) and integration tests
//! - Expects concrete [`EventSource`] and [`EventStore`] implementations
//!
//! # Error Handling
//! Failing to read the baseline or any upstream page aborts the run with a
//! [`SyncError`]; callers log it and surface a generic failure. Single-record
//! store errors never reach this level.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Supporting items: [`baseline_from_latest`], [`SyncReport`].

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::SyncSettings;
use crate::contract::{EventSource, EventStore};
use crate::error::SyncError;
use crate::paginate::fetch_and_save_all;

/// Outcome envelope of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub success: bool,
    pub message: String,
    pub count: u64,
}

impl SyncReport {
    pub fn synced(count: u64) -> Self {
        Self {
            success: true,
            message: format!("Successfully synced {count} events"),
            count,
        }
    }
}

/// Midnight (`+00:00`) of the latest stored start date, or of `today`.
pub fn baseline_from_latest(latest_start: Option<&str>, today: NaiveDate) -> String {
    let date = latest_start
        .filter(|s| !s.is_empty())
        .and_then(|s| s.split('T').next())
        .map(str::to_string)
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
    format!("{date}T00:00:00+00:00")
}

/// Runs one sync with today's UTC date as the fallback baseline.
pub async fn synchronise<Src, St>(
    source: &Src,
    store: &St,
    settings: &SyncSettings,
) -> Result<SyncReport, SyncError>
where
    Src: EventSource + ?Sized,
    St: EventStore + ?Sized,
{
    synchronise_on(source, store, settings, Utc::now().date_naive()).await
}

/// Runs one sync, using `today` when the store holds no usable start time.
pub async fn synchronise_on<Src, St>(
    source: &Src,
    store: &St,
    settings: &SyncSettings,
    today: NaiveDate,
) -> Result<SyncReport, SyncError>
where
    Src: EventSource + ?Sized,
    St: EventStore + ?Sized,
{
    info!("[SYNC] Starting events synchronisation");

    let latest = match store.latest_start_datetime().await {
        Ok(latest) => latest,
        Err(e) => {
            error!(error = %e, "[SYNC][ERROR] Failed to read latest stored event");
            return Err(SyncError::Store(e));
        }
    };
    let baseline = baseline_from_latest(latest.as_deref(), today);
    info!(latest = ?latest, baseline = %baseline, "[SYNC] Determined baseline");

    let saved = match fetch_and_save_all(source, store, settings, &baseline).await {
        Ok(saved) => saved,
        Err(e) => {
            error!(error = %e, "[SYNC][ERROR] Error fetching events");
            return Err(e.into());
        }
    };

    info!(saved, "[SYNC] Synchronisation complete");
    Ok(SyncReport::synced(saved))
}
