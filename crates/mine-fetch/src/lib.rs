//! Resource transports for mine
//!
//! A [`Fetcher`] turns a source locator into bytes. Two transports exist:
//! [`HttpFetcher`] for `http(s)://` sources and [`LocalFetcher`] for local
//! mirrors (`file://` or plain paths). [`fetcher_for`] picks one at the
//! process boundary; [`fetch_with_retry`] layers the timeout and backoff
//! policy on top of whichever transport is in use.

pub mod error;
pub mod fetcher;
pub mod http;
pub mod local;
pub mod retry;

pub use error::FetchError;
pub use fetcher::{Fetcher, fetcher_for, join_locator};
pub use http::HttpFetcher;
pub use local::LocalFetcher;
pub use retry::{RetryPolicy, fetch_with_retry};
