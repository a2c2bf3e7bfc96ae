use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::SyncResult;

/// Raw outcome of a single page request.
#[derive(Debug)]
pub enum PageResponse {
    /// 2xx response with its undecoded body.
    Success(Vec<u8>),
    /// Any other status, with the body text for diagnostics.
    Failure { status: StatusCode, body: String },
}

/// HTTP client for the admin items endpoint.
#[derive(Debug, Clone)]
pub struct ItemsClient {
    client: reqwest::Client,
}

impl ItemsClient {
    pub fn new(request_timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Issues an authenticated GET for one page.
    ///
    /// Transport failures are returned as errors. HTTP error statuses are not: they come back as
    /// [`PageResponse::Failure`] so the caller can stop with the data it already has.
    pub async fn get_page(&self, url: &str, token: &SecretString) -> SyncResult<PageResponse> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read body>".to_string());

            return Ok(PageResponse::Failure { status, body });
        }

        let body = response.bytes().await?;

        Ok(PageResponse::Success(body.to_vec()))
    }
}
