//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// What a resource write did to the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file did not exist and was created.
    Created,
    /// The file existed with different bytes and was replaced.
    Updated,
    /// The file already held exactly these bytes; nothing was written.
    Unchanged,
}

/// What a delete did to the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing was there; treated as success.
    Absent,
}

/// Write content atomically to a file with locking.
///
/// Missing parent directories are created. Uses write-to-temp-then-rename so
/// readers never observe a partially written file, and holds an advisory
/// lock on the temp file while writing.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let result = (|| {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .lock_exclusive()
            .map_err(|_| Error::LockFailed {
                path: native_path.clone(),
            })?;

        temp_file
            .write_all(content)
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

        FileExt::unlock(&temp_file).map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;
        drop(temp_file);

        fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Read a file, returning `None` when it does not exist.
pub fn read_optional(path: &NormalizedPath) -> Result<Option<Vec<u8>>> {
    let native_path = path.to_native();
    match fs::read(&native_path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Materialize a tool-managed resource at `path`.
///
/// Last writer wins: existing files are replaced regardless of their
/// content. Writing bytes the file already holds is a no-op.
pub fn write_resource(path: &NormalizedPath, content: &[u8]) -> Result<WriteOutcome> {
    let outcome = match read_optional(path) {
        Ok(Some(existing)) if existing == content => {
            tracing::debug!(path = %path, "Resource already up to date");
            return Ok(WriteOutcome::Unchanged);
        }
        Ok(Some(_)) => WriteOutcome::Updated,
        // An unreadable existing file is still overwritten
        Ok(None) | Err(_) => {
            if path.is_file() {
                WriteOutcome::Updated
            } else {
                WriteOutcome::Created
            }
        }
    };

    write_atomic(path, content)?;
    tracing::debug!(path = %path, ?outcome, "Wrote resource");
    Ok(outcome)
}

/// Delete a file. A missing file counts as success.
pub fn delete_file(path: &NormalizedPath) -> Result<DeleteOutcome> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(DeleteOutcome::Deleted),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeleteOutcome::Absent),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

/// Remove a directory only if it exists and is empty.
///
/// Returns `true` when the directory was removed.
pub fn remove_dir_if_empty(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    let mut entries = match fs::read_dir(&native_path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(Error::io(&native_path, e)),
    };
    if entries.next().is_some() {
        return Ok(false);
    }
    fs::remove_dir(&native_path).map_err(|e| Error::io(&native_path, e))?;
    Ok(true)
}
