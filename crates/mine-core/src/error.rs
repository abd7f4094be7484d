//! Error types for mine-core

use std::path::PathBuf;

/// Result type for mine-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop an operation before it starts changing anything
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The catalog file is malformed
    #[error("Invalid catalog: {message}")]
    InvalidCatalog { message: String },

    /// The resolved configuration is unusable
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A template needed for recovery does not exist
    #[error("Template not found at {path}")]
    TemplateNotFound { path: PathBuf },

    /// Managed document could not be inspected
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Filesystem error from mine-fs
    #[error(transparent)]
    Fs(#[from] mine_fs::Error),

    /// Transport setup error from mine-fetch
    #[error(transparent)]
    Fetch(#[from] mine_fetch::FetchError),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

/// The shared instruction document could not be merged or stripped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("cannot read {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("cannot write {path}: {message}")]
    Unwritable { path: PathBuf, message: String },
}

impl MergeError {
    pub(crate) fn unreadable(path: &mine_fs::NormalizedPath, error: &mine_fs::Error) -> Self {
        Self::Unreadable {
            path: path.to_native(),
            message: error.to_string(),
        }
    }

    pub(crate) fn unwritable(path: &mine_fs::NormalizedPath, error: &mine_fs::Error) -> Self {
        Self::Unwritable {
            path: path.to_native(),
            message: error.to_string(),
        }
    }
}

/// Failures that abort a run instead of being recorded per resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalError {
    #[error("could not record the installed version at {path}: {message}")]
    VersionStoreUnwritable { path: PathBuf, message: String },

    #[error("managed section update failed: {0}")]
    MergeFailed(#[source] MergeError),

    #[error("another mine run holds the lock at {path}")]
    LockBusy { path: PathBuf },

    #[error("could not lock {path}: {message}")]
    LockFailed { path: PathBuf, message: String },
}

impl FatalError {
    pub(crate) fn from_lock(error: mine_fs::Error, path: &mine_fs::NormalizedPath) -> Self {
        match error {
            mine_fs::Error::LockBusy { path } => Self::LockBusy { path },
            other => Self::LockFailed {
                path: path.to_native(),
                message: other.to_string(),
            },
        }
    }
}
