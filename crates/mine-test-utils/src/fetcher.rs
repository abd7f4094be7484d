//! [`MemoryFetcher`]: a transport that never touches the network.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mine_fetch::{FetchError, Fetcher};

#[derive(Debug, Clone)]
enum Script {
    Serve(Vec<u8>),
    Fail(FetchError),
    /// Fail with a transient error this many more times, then serve.
    Flaky(usize, Vec<u8>),
}

/// In-memory fetcher keyed by exact locator.
///
/// Unknown locators are `NotFound` unless [`MemoryFetcher::serving_everything`]
/// was used, in which case they return `content of <locator>`.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    serve_unknown: bool,
    delay: Option<Duration>,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serving_everything() -> Self {
        Self {
            serve_unknown: true,
            ..Self::default()
        }
    }

    /// The body served for an unscripted locator by a serve-everything fetcher.
    pub fn default_body(locator: &str) -> Vec<u8> {
        format!("content of {locator}").into_bytes()
    }

    pub fn with_resource(self, locator: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.script(locator.into(), Script::Serve(body.into()))
    }

    pub fn with_failure(self, locator: impl Into<String>, error: FetchError) -> Self {
        self.script(locator.into(), Script::Fail(error))
    }

    /// Fail `failures` times with a network error, then serve `body`.
    pub fn with_flaky(
        self,
        locator: impl Into<String>,
        failures: usize,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.script(locator.into(), Script::Flaky(failures, body.into()))
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn script(self, locator: String, script: Script) -> Self {
        self.scripts.lock().unwrap().insert(locator, script);
        self
    }

    /// Number of fetch attempts made for `locator`.
    pub fn calls_for(&self, locator: &str) -> usize {
        self.calls.lock().unwrap().get(locator).copied().unwrap_or(0)
    }

    /// Total fetch attempts across all locators.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Highest number of fetches observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(locator) {
            Some(Script::Serve(body)) => Ok(body.clone()),
            Some(Script::Fail(error)) => Err(error.clone()),
            Some(Script::Flaky(remaining, body)) => {
                if *remaining > 0 {
                    *remaining -= 1;
                    Err(FetchError::network("scripted transient failure"))
                } else {
                    Ok(body.clone())
                }
            }
            None if self.serve_unknown => Ok(Self::default_body(locator)),
            None => Err(FetchError::NotFound {
                locator: locator.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(locator.to_string())
            .or_default() += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.respond(locator);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
