//! Error types for mine-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that end the process with a non-zero exit code
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from mine-core
    #[error(transparent)]
    Core(#[from] mine_core::Error),

    /// Error from mine-fs
    #[error(transparent)]
    Fs(#[from] mine_fs::Error),

    /// Transport could not be set up
    #[error(transparent)]
    Fetch(#[from] mine_fetch::FetchError),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
