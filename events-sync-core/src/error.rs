//! Error types for the sync pipeline.
//!
//! Upstream failures are fatal to a run; a [`StoreError`] on a single record
//! is absorbed by the dedup-insert loop, but one raised while reading the
//! baseline aborts the run.

/// Error type for the [`crate::contract::EventStore`] seam (simple boxed error, as
/// each backing store brings its own).
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to obtain one page from the upstream events API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("API request failed: {status} {body}")]
    Status { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure of a whole sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),

    #[error("store query failed: {0}")]
    Store(StoreError),
}
