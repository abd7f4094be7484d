//! Filesystem layer for mine
//!
//! Everything that touches the local disk goes through this crate:
//! idempotent resource writes and deletes, atomic replacement of shared
//! documents, format-agnostic structured files and the advisory install lock.

pub mod config;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result, WriteErrorKind};
pub use io::{DeleteOutcome, WriteOutcome};
pub use lock::InstallLock;
pub use path::{NormalizedPath, validate_relative_path};
