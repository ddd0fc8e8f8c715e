//! HTTP client for the council open-data `records` endpoint.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::contract::{EventSource, PageRequest};
use crate::error::FetchError;
use crate::record::EventPage;

/// The Brisbane City Council events dataset.
pub const DEFAULT_BASE_URL: &str =
    "https://data.brisbane.qld.gov.au/api/explore/v2.1/catalog/datasets/brisbane-city-council-events/records";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the request URL for one page.
///
/// With a baseline the query filters on `start_datetime >= '<baseline>'` and
/// orders by `start_datetime`.
pub fn page_url(base_url: &str, request: &PageRequest) -> String {
    match &request.since {
        Some(since) => format!(
            "{base_url}?where=start_datetime%20%3E%3D%20%27{}%27&order_by=start_datetime&limit={}&offset={}",
            urlencoding::encode(since),
            request.limit,
            request.offset
        ),
        None => format!(
            "{base_url}?limit={}&offset={}",
            request.limit, request.offset
        ),
    }
}

/// Decodes a 2xx response body. A body without `results` is a decode error,
/// not an empty page.
pub fn decode_page(body: &str) -> Result<EventPage, FetchError> {
    Ok(serde_json::from_str(body)?)
}

/// [`EventSource`] backed by reqwest.
pub struct HttpEventSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<EventPage, FetchError> {
        let url = page_url(&self.base_url, request);
        info!(url = %url, "Fetching events");

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "API request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let page = decode_page(&body)?;
        debug!(
            total_count = page.total_count,
            results = page.results.len(),
            "Decoded events page"
        );
        Ok(page)
    }
}
