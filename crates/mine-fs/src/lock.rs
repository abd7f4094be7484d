//! Advisory lock guarding a base root against concurrent mine runs

use std::fs::{self, File, OpenOptions};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// An exclusive advisory lock held on a lock file.
///
/// The lock is released when the value is dropped. The lock file itself is
/// left in place unless [`InstallLock::release_and_remove`] is used.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: NormalizedPath,
}

impl InstallLock {
    /// Try to take the lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockBusy`] if another process holds the lock.
    pub fn acquire(path: &NormalizedPath) -> Result<Self> {
        let native_path = path.to_native();
        if let Some(parent) = native_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&native_path)
            .map_err(|e| Error::io(&native_path, e))?;

        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                Error::LockBusy {
                    path: native_path.clone(),
                }
            } else {
                Error::LockFailed {
                    path: native_path.clone(),
                }
            }
        })?;

        tracing::debug!(path = %path, "Acquired install lock");
        Ok(Self {
            file,
            path: path.clone(),
        })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Release the lock and delete the lock file.
    pub fn release_and_remove(self) -> Result<()> {
        let path = self.path.clone();
        drop(self);
        crate::io::delete_file(&path).map(|_| ())
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
