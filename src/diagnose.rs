//! Health checks for the store and the upstream API.
//!
//! Each check reports a JSON object instead of failing, so one broken side
//! never hides the state of the other.

use serde_json::{json, Value};
use tracing::error;

use events_sync_core::contract::{EventSource, PageRequest};
use events_sync_core::error::StoreError;

use crate::store::SqliteEventStore;

async fn database_report(store: &SqliteEventStore) -> Result<Value, StoreError> {
    if !store.table_exists().await? {
        return Ok(json!({
            "success": false,
            "message": "The 'events' table does not exist in the database",
        }));
    }
    let count = store.count_events().await?;
    let sample = if count > 0 {
        store.sample_event().await?
    } else {
        None
    };
    Ok(json!({
        "success": true,
        "message": "Database connection successful",
        "table_exists": true,
        "event_count": count,
        "sample_event": sample,
    }))
}

/// Checks that the `events` table exists and reports its size and first row.
pub async fn check_database(store: &SqliteEventStore) -> Value {
    database_report(store).await.unwrap_or_else(|e| {
        error!(error = %e, "Database check failed");
        json!({ "success": false, "message": e.to_string() })
    })
}

/// Fetches a single unfiltered record from the upstream API.
pub async fn check_api<S>(source: &S) -> Value
where
    S: EventSource + ?Sized,
{
    let probe = PageRequest {
        since: None,
        limit: 1,
        offset: 0,
    };
    match source.fetch_page(&probe).await {
        Ok(page) => json!({
            "success": true,
            "message": "API connection successful",
            "total_count": page.total_count,
            "sample_result": page.results.first(),
        }),
        Err(e) => {
            error!(error = %e, "API check failed");
            json!({ "success": false, "message": e.to_string() })
        }
    }
}

/// Combined report; the API side is `null` when skipped.
pub async fn diagnose<S>(store: &SqliteEventStore, source: Option<&S>) -> Value
where
    S: EventSource + ?Sized,
{
    let database = check_database(store).await;
    let api = match source {
        Some(source) => check_api(source).await,
        None => Value::Null,
    };
    json!({ "database": database, "api": api })
}
