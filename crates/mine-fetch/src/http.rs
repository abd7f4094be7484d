//! HTTP transport

use async_trait::async_trait;

use crate::{FetchError, Fetcher};

/// Statuses worth another attempt: throttling, conflicts and server errors.
pub fn should_retry_status(status: u16) -> bool {
    status == 408 || status == 409 || status == 425 || status == 429 || status >= 500
}

/// Fetches resources over HTTP(S) with rustls.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::network(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn classify_status(locator: &str, status: u16) -> FetchError {
    match status {
        404 | 410 => FetchError::NotFound {
            locator: locator.to_string(),
        },
        s if should_retry_status(s) => FetchError::network(format!("HTTP {s}")),
        s => FetchError::Rejected { status: s },
    }
}

fn classify_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::network(error.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(locator, status = status.as_u16(), "Fetch returned error status");
            return Err(classify_status(locator, status.as_u16()));
        }

        let body = response.bytes().await.map_err(classify_error)?;
        Ok(body.to_vec())
    }
}
