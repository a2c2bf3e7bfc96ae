use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

const fn default_page_delay() -> Duration {
    SourceConfig::DEFAULT_PAGE_DELAY
}

const fn default_request_timeout() -> Duration {
    SourceConfig::DEFAULT_REQUEST_TIMEOUT
}

fn default_items_field() -> String {
    SourceConfig::DEFAULT_ITEMS_FIELD.to_string()
}

fn default_continuation_field() -> String {
    SourceConfig::DEFAULT_CONTINUATION_FIELD.to_string()
}

/// Configuration of the admin items endpoint and the pagination loop.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// URL of the first page.
    pub endpoint: String,
    /// Response field holding the page's item list.
    #[serde(default = "default_items_field")]
    pub items_field: String,
    /// Response field holding the link to the next page.
    #[serde(default = "default_continuation_field")]
    pub continuation_field: String,
    /// Fixed delay between two consecutive page requests.
    ///
    /// Default: 500ms
    #[serde(default = "default_page_delay", with = "humantime_serde")]
    pub page_delay: Duration,
    /// Timeout applied to every HTTP request.
    ///
    /// Default: 30s
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Upper bound on fetched pages. Unbounded when absent.
    #[serde(default)]
    pub max_pages: Option<u32>,
}

impl SourceConfig {
    pub const DEFAULT_ITEMS_FIELD: &'static str = "itemEntities";
    pub const DEFAULT_CONTINUATION_FIELD: &'static str = "continuationUri";
    pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Builds a source configuration with default field names and timings.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            items_field: default_items_field(),
            continuation_field: default_continuation_field(),
            page_delay: default_page_delay(),
            request_timeout: default_request_timeout(),
            max_pages: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.trim().is_empty() {
            return Err(ValidationError::EmptyField("source.endpoint"));
        }
        if self.items_field.trim().is_empty() {
            return Err(ValidationError::EmptyField("source.items_field"));
        }
        if self.continuation_field.trim().is_empty() {
            return Err(ValidationError::EmptyField("source.continuation_field"));
        }
        if self.request_timeout.is_zero() {
            return Err(ValidationError::InvalidFieldValue {
                field: "source.request_timeout".to_string(),
                constraint: "must be greater than zero".to_string(),
            });
        }
        if self.max_pages == Some(0) {
            return Err(ValidationError::InvalidFieldValue {
                field: "source.max_pages".to_string(),
                constraint: "must be greater than zero when set".to_string(),
            });
        }

        Ok(())
    }
}
