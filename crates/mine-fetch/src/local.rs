//! Local mirror transport

use std::path::Path;

use async_trait::async_trait;

use crate::{FetchError, Fetcher};

/// Reads resources from the local filesystem.
///
/// Locators are `file://` URLs or plain paths. Read failures other than a
/// missing file are reported as [`FetchError::Network`] so they get the
/// same retry treatment as a flaky remote.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFetcher;

impl LocalFetcher {
    fn path_of(locator: &str) -> &Path {
        Path::new(locator.strip_prefix("file://").unwrap_or(locator))
    }
}

#[async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        let path = Self::path_of(locator);
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                locator: locator.to_string(),
            }),
            Err(e) => Err(FetchError::network(format!("{}: {}", path.display(), e))),
        }
    }
}
