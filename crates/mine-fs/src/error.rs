//! Error types for mine-fs

use std::path::PathBuf;

/// Result type for mine-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mine-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} file at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} file at {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported structured file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Another mine run holds the lock at {path}")]
    LockBusy { path: PathBuf },
}

/// Coarse classification of a failed resource write, as shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteErrorKind {
    PermissionDenied,
    DiskFull,
    Other,
}

impl std::fmt::Display for WriteErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PermissionDenied => "permission denied",
            Self::DiskFull => "disk full",
            Self::Other => "write failed",
        };
        write!(f, "{}", s)
    }
}

/// ENOSPC on Linux and macOS alike.
const ENOSPC: i32 = 28;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the file simply was not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }

    /// Classify the error for a per-resource report entry.
    pub fn write_kind(&self) -> WriteErrorKind {
        match self {
            Self::Io { source, .. } => match source.kind() {
                std::io::ErrorKind::PermissionDenied => WriteErrorKind::PermissionDenied,
                std::io::ErrorKind::StorageFull => WriteErrorKind::DiskFull,
                _ if source.raw_os_error() == Some(ENOSPC) => WriteErrorKind::DiskFull,
                _ => WriteErrorKind::Other,
            },
            _ => WriteErrorKind::Other,
        }
    }
}
