//! Error types for mine-fetch

/// Why a resource could not be fetched.
///
/// Only [`FetchError::Timeout`] and [`FetchError::Network`] are transient;
/// the retry loop gives up immediately on the others.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("timed out")]
    Timeout,

    #[error("not found: {locator}")]
    NotFound { locator: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("rejected with HTTP {status}")]
    Rejected { status: u16 },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network { .. })
    }
}
