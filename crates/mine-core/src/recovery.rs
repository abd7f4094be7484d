//! Backup-and-recreate for malformed structured state files
//!
//! Downstream assistants keep structured state next to the installed
//! templates. When such a file no longer parses it is moved aside with a
//! timestamped suffix and recreated from its template.

use chrono::Utc;
use mine_fs::config::Format;
use mine_fs::{ConfigStore, Error as FsError, NormalizedPath, io};

use crate::{Error, Result};

/// What [`recover_state_file`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The file parsed; nothing changed
    Healthy,
    /// The file was missing and was created from the template
    Created,
    /// The file was malformed, backed up and recreated
    Recovered { backup: NormalizedPath },
}

/// Ensure `path` holds well-formed structured data.
///
/// The format is detected from the extension. The replacement is written
/// atomically, so the file is never observed half-written.
pub fn recover_state_file(path: &NormalizedPath, template: &NormalizedPath) -> Result<RecoveryOutcome> {
    let format = Format::from_path(path)?;

    let existing = io::read_optional(path)?;
    if let Some(bytes) = &existing
        && is_well_formed(path, format, bytes)
    {
        tracing::debug!(path = %path, "State file is well formed");
        return Ok(RecoveryOutcome::Healthy);
    }

    let replacement = match io::read_optional(template)? {
        Some(bytes) => bytes,
        None => {
            return Err(Error::TemplateNotFound {
                path: template.to_native(),
            });
        }
    };

    if existing.is_none() {
        io::write_atomic(path, &replacement)?;
        tracing::info!(path = %path, "Created state file from template");
        return Ok(RecoveryOutcome::Created);
    }

    let backup = path.with_name_suffix(&format!(
        ".corrupt-{}",
        Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
    ));
    std::fs::rename(path.to_native(), backup.to_native())
        .map_err(|e| FsError::io(path.to_native(), e))?;
    io::write_atomic(path, &replacement)?;

    tracing::warn!(path = %path, backup = %backup, "Recovered malformed state file");
    Ok(RecoveryOutcome::Recovered { backup })
}

fn is_well_formed(path: &NormalizedPath, format: Format, bytes: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return false;
    };
    ConfigStore::new()
        .parse::<serde_json::Value>(path, format, text)
        .is_ok()
}
