//! Shared test utilities for the mine workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`fetcher`]: in-memory [`MemoryFetcher`] with scripted failures
//! - [`root`]: [`TestRoot`] temporary base root with assertion helpers

pub mod fetcher;
pub mod root;

pub use fetcher::MemoryFetcher;
pub use root::TestRoot;
