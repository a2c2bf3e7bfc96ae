//! Continuation-link pagination over the admin items endpoint.

use std::time::Duration;

use itemsync_config::shared::SourceConfig;
use secrecy::SecretString;
use tracing::{debug, error, info, warn};

use crate::error::SyncResult;
use crate::source::{ItemsClient, PageResponse};
use crate::types::{ItemRecord, Page};

/// Why pagination stopped before the server ran out of pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationHalt {
    /// A page request returned a non-success status.
    HttpStatus { url: String, status: u16, body: String },
    /// The configured page cap was reached while a continuation link was still pending.
    PageLimit { max_pages: u32 },
}

/// Items retrieved by a pagination run.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Records in page order, then in-page order.
    pub items: Vec<ItemRecord>,
    /// Number of pages successfully fetched and decoded.
    pub pages_fetched: u32,
    /// Set when the result is partial.
    pub halt: Option<PaginationHalt>,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.halt.is_none()
    }
}

/// Follows continuation links from the configured endpoint until exhausted.
#[derive(Debug, Clone)]
pub struct Paginator {
    client: ItemsClient,
    endpoint: String,
    items_field: String,
    continuation_field: String,
    page_delay: Duration,
    max_pages: Option<u32>,
}

impl Paginator {
    pub fn new(config: &SourceConfig) -> SyncResult<Self> {
        Ok(Self {
            client: ItemsClient::new(config.request_timeout)?,
            endpoint: config.endpoint.clone(),
            items_field: config.items_field.clone(),
            continuation_field: config.continuation_field.clone(),
            page_delay: config.page_delay,
            max_pages: config.max_pages,
        })
    }

    /// Fetches every page reachable from the endpoint.
    ///
    /// Pages are requested strictly one after another with the configured delay in between.
    /// A non-success status stops the loop and keeps what was accumulated; the halt is recorded
    /// in the outcome. Transport errors and malformed bodies are returned as errors.
    pub async fn fetch_all(&self, token: &SecretString) -> SyncResult<FetchOutcome> {
        let mut outcome = FetchOutcome::default();
        let mut current_url = Some(self.endpoint.clone());

        info!(endpoint = %self.endpoint, "starting item retrieval");

        while let Some(url) = current_url.take() {
            if outcome.pages_fetched > 0 {
                tokio::time::sleep(self.page_delay).await;
            }

            let body = match self.client.get_page(&url, token).await? {
                PageResponse::Success(body) => body,
                PageResponse::Failure { status, body } => {
                    error!(
                        url = %url,
                        status = %status,
                        body = %body,
                        pages_fetched = outcome.pages_fetched,
                        "page request failed, keeping items fetched so far"
                    );

                    outcome.halt = Some(PaginationHalt::HttpStatus {
                        url,
                        status: status.as_u16(),
                        body,
                    });
                    break;
                }
            };

            let page = Page::from_body(&body, &self.items_field, &self.continuation_field)?;
            outcome.pages_fetched += 1;

            debug!(
                page = outcome.pages_fetched,
                items = page.items.len(),
                has_next = page.continuation.is_some(),
                "page fetched"
            );

            outcome.items.extend(page.items);
            current_url = page.continuation;

            if current_url.is_some()
                && let Some(max_pages) = self.max_pages
                && outcome.pages_fetched >= max_pages
            {
                warn!(max_pages, "page limit reached, stopping before the last page");

                outcome.halt = Some(PaginationHalt::PageLimit { max_pages });
                break;
            }
        }

        info!(
            pages = outcome.pages_fetched,
            items = outcome.items.len(),
            complete = outcome.is_complete(),
            "item retrieval finished"
        );

        Ok(outcome)
    }
}
