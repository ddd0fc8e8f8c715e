//! Drives fetch-page / save-page cycles until the upstream result set is exhausted.

use tracing::{debug, info, warn};

use crate::config::SyncSettings;
use crate::contract::{EventSource, EventStore, PageRequest};
use crate::dedup::save_events;
use crate::error::FetchError;

/// Fetches every record starting at `baseline` and saves the new ones.
///
/// Pages are requested strictly in sequence; each page is fully saved before
/// the next request. Stops once the records seen reach the upstream
/// `total_count`, or on the first empty page. An upstream failure aborts the
/// run immediately; rows saved from earlier pages stay saved.
///
/// Returns the number of rows inserted.
pub async fn fetch_and_save_all<Src, St>(
    source: &Src,
    store: &St,
    settings: &SyncSettings,
    baseline: &str,
) -> Result<u64, FetchError>
where
    Src: EventSource + ?Sized,
    St: EventStore + ?Sized,
{
    let limit = settings.page_size.max(1);
    let mut offset = 0u64;
    let mut processed = 0u64;
    let mut saved = 0u64;

    loop {
        let request = PageRequest {
            since: Some(baseline.to_string()),
            limit,
            offset,
        };
        info!(baseline, offset, limit, "[FETCH] Fetching events page");
        let page = source.fetch_page(&request).await?;
        let total_count = page.total_count;
        let received = page.results.len() as u64;

        if received == 0 {
            if processed < total_count {
                warn!(
                    offset,
                    processed,
                    total_count,
                    "[FETCH] Empty page before reaching total_count, stopping"
                );
            }
            break;
        }

        let page_saved = save_events(
            store,
            &page.results,
            settings.batch_size,
            settings.key_matching,
        )
        .await as u64;
        saved += page_saved;
        processed += received;
        offset += limit;

        debug!(
            received,
            page_saved,
            processed,
            total_count,
            "[FETCH] Page processed"
        );

        if processed >= total_count {
            break;
        }
    }

    info!(saved, processed, "[FETCH] All pages processed");
    Ok(saved)
}
