//! Installed version tracking
//!
//! A single token at a fixed path records the catalog version of the last
//! finalized install. It is read once while planning and written once,
//! last, while finalizing.

use std::cmp::Ordering;

use mine_fs::{DeleteOutcome, NormalizedPath, io};

/// What the version file says.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionState {
    pub installed_version: Option<String>,
}

impl VersionState {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn installed(version: impl Into<String>) -> Self {
        Self {
            installed_version: Some(version.into()),
        }
    }
}

/// Reads and writes the version token.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: NormalizedPath,
}

impl VersionStore {
    pub fn new(path: NormalizedPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Read the installed version.
    ///
    /// An unreadable or non-UTF-8 token counts as not installed, so the
    /// next run takes the fresh install path and rewrites it.
    pub fn read(&self) -> VersionState {
        let bytes = match io::read_optional(&self.path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return VersionState::absent(),
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "Version file unreadable, treating as not installed");
                return VersionState::absent();
            }
        };

        match String::from_utf8(bytes) {
            Ok(text) if text.trim().is_empty() => VersionState::absent(),
            Ok(text) => VersionState::installed(text.trim()),
            Err(_) => {
                tracing::warn!(path = %self.path, "Version file is not text, treating as not installed");
                VersionState::absent()
            }
        }
    }

    pub fn write(&self, version: &str) -> mine_fs::Result<()> {
        io::write_atomic(&self.path, format!("{version}\n").as_bytes())?;
        tracing::debug!(path = %self.path, version, "Recorded installed version");
        Ok(())
    }

    pub fn clear(&self) -> mine_fs::Result<DeleteOutcome> {
        io::delete_file(&self.path)
    }
}

/// Which branch a run takes, decided while planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAction {
    /// Nothing recorded yet
    FreshInstall,
    /// A different version (possibly unrecognised) is recorded
    Upgrade { from: String },
    /// Same version recorded but files are missing, or the run was forced
    Reinstall,
    /// Same version recorded and everything in place
    UpToDate,
    /// Upgrade requested with nothing installed
    NotInstalled,
    Uninstall,
}

impl InstallAction {
    /// Branch for an install given what is recorded and what is targeted.
    pub fn decide(state: &VersionState, target: &str) -> Self {
        match state.installed_version.as_deref() {
            None => Self::FreshInstall,
            Some(installed) if installed == target => Self::Reinstall,
            Some(installed) => Self::Upgrade {
                from: installed.to_string(),
            },
        }
    }
}

/// Direction of a version change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChange {
    Newer,
    Older,
    Same,
    /// One side is not a semantic version
    Unknown,
}

/// Compare an installed version with the target.
pub fn compare_versions(installed: &str, target: &str) -> VersionChange {
    let parse = |v: &str| semver::Version::parse(v.trim_start_matches('v'));
    match (parse(installed), parse(target)) {
        (Ok(from), Ok(to)) => match to.cmp(&from) {
            Ordering::Greater => VersionChange::Newer,
            Ordering::Less => VersionChange::Older,
            Ordering::Equal => VersionChange::Same,
        },
        _ => VersionChange::Unknown,
    }
}
