//! Transport trait and transport selection

use std::sync::Arc;

use async_trait::async_trait;

use crate::{FetchError, HttpFetcher, LocalFetcher};

/// Fetch the bytes behind a source locator.
///
/// Implementations perform a single attempt. Timeouts and retries are the
/// caller's concern, see [`crate::fetch_with_retry`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(locator).await
    }
}

/// Pick the transport for a resource source.
///
/// `http://` and `https://` sources use [`HttpFetcher`]; anything else is a
/// local mirror read by [`LocalFetcher`].
pub fn fetcher_for(source: &str) -> Result<Arc<dyn Fetcher>, FetchError> {
    if is_http(source) {
        tracing::debug!(source, "Using HTTP transport");
        Ok(Arc::new(HttpFetcher::new()?))
    } else {
        tracing::debug!(source, "Using local mirror transport");
        Ok(Arc::new(LocalFetcher))
    }
}

/// Join a base source and a relative resource path with exactly one `/`.
pub fn join_locator(source: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        source.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

fn is_http(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
