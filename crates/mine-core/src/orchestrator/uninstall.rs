//! Uninstall: reverse an install without touching the network

use mine_blocks::{StripOutcome, find_marker, strip};
use mine_fs::{DeleteOutcome, InstallLock, io};

use super::Orchestrator;
use crate::error::{FatalError, MergeError};
use crate::render::MARKER;
use crate::report::{DocumentOutcome, ErrorKind, OperationReport, RunOutcome};
use crate::version::InstallAction;

impl Orchestrator {
    /// Remove every catalog resource, the managed section, the preferences
    /// file and the version token.
    ///
    /// Missing files are not errors, so uninstalling from an empty root is
    /// a successful no-op.
    pub fn uninstall(&self) -> RunOutcome {
        let action = InstallAction::Uninstall;
        let mut report = OperationReport::empty();
        tracing::info!(root = %self.target.base_root(), "Uninstalling");

        let lock_path = self.target.lock_file();
        let lock = if self.target.base_root().is_dir() {
            match InstallLock::acquire(&lock_path) {
                Ok(lock) => Some(lock),
                Err(e) => {
                    return RunOutcome::fatal(FatalError::from_lock(e, &lock_path), action, report);
                }
            }
        } else {
            None
        };

        for resource in self.catalog.resources() {
            match io::delete_file(&self.target.destination(resource)) {
                Ok(DeleteOutcome::Deleted) => report.record_success(resource),
                Ok(DeleteOutcome::Absent) => report.skipped.push(resource.clone()),
                Err(e) => report.record_failure(resource, ErrorKind::Write(e.write_kind())),
            }
        }

        let bundle_roots = self
            .catalog
            .bundles()
            .into_iter()
            .map(|bundle| self.target.bundle_root(bundle));
        let group_roots = self
            .catalog
            .groups()
            .iter()
            .map(|group| self.target.group_root(group.kind));
        for dir in bundle_roots.chain(group_roots) {
            if let Err(e) = io::remove_dir_if_empty(&dir) {
                report.warn(format!("could not remove {dir}: {e}"));
            }
        }

        match self.strip_document() {
            Ok(outcome) => report.document = Some(outcome),
            Err(e) => {
                release_lock(lock, &mut report);
                return RunOutcome::fatal(FatalError::MergeFailed(e), action, report);
            }
        }

        if !self.options.keep_preferences {
            let path = self.target.preferences();
            if let Err(e) = io::delete_file(&path) {
                report.warn(format!("could not remove preferences at {path}: {e}"));
            }
        }

        if let Err(e) = self.versions.clear() {
            let error = FatalError::VersionStoreUnwritable {
                path: self.versions.path().to_native(),
                message: e.to_string(),
            };
            release_lock(lock, &mut report);
            return RunOutcome::fatal(error, action, report);
        }

        release_lock(lock, &mut report);
        if let Err(e) = io::remove_dir_if_empty(self.target.base_root()) {
            tracing::debug!(error = %e, "Base root left in place");
        }

        tracing::info!(
            removed = report.succeeded.len(),
            failed = report.failed.len(),
            "Uninstalled"
        );
        RunOutcome::done(action, report)
    }

    /// Remove the managed section, deleting the file if nothing else is left.
    fn strip_document(&self) -> Result<DocumentOutcome, MergeError> {
        let path = self.target.managed_document();
        let Some(existing) =
            io::read_optional(&path).map_err(|e| MergeError::unreadable(&path, &e))?
        else {
            return Ok(DocumentOutcome::Absent);
        };

        if find_marker(&existing, MARKER.as_bytes()).is_none() {
            tracing::debug!(path = %path, "No managed section present");
            return Ok(DocumentOutcome::Untouched);
        }

        match strip(&existing, MARKER) {
            StripOutcome::Write(prefix) => {
                io::write_atomic(&path, &prefix).map_err(|e| MergeError::unwritable(&path, &e))?;
                Ok(DocumentOutcome::Stripped)
            }
            StripOutcome::Delete => {
                io::delete_file(&path).map_err(|e| MergeError::unwritable(&path, &e))?;
                Ok(DocumentOutcome::Deleted)
            }
        }
    }
}

/// Unlock and delete the lock file, if one was taken.
fn release_lock(lock: Option<InstallLock>, report: &mut OperationReport) {
    if let Some(lock) = lock
        && let Err(e) = lock.release_and_remove()
    {
        report.warn(format!("could not remove lock file: {e}"));
    }
}
