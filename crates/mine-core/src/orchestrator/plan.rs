//! Read-only views: dry-run plans and status checks

use mine_fs::{NormalizedPath, io};
use serde::Serialize;
use similar::TextDiff;

use super::{Orchestrator, SyncMode};
use crate::Result;
use crate::catalog::ResourceDescriptor;
use crate::error::MergeError;
use crate::render::{MARKER, render_managed};
use crate::version::InstallAction;

/// A resource as it would be placed by the planned run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedResource {
    pub resource: ResourceDescriptor,
    pub destination: NormalizedPath,
    /// Whether something already exists at the destination
    pub exists: bool,
}

/// What an install or upgrade would do, computed without fetching or writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub action: InstallAction,
    pub installed_version: Option<String>,
    pub target_version: String,
    /// Empty when the run would short-circuit
    pub resources: Vec<PlannedResource>,
    /// Unified diff of the shared document, empty if it would not change
    pub document_diff: String,
    pub creates_preferences: bool,
}

impl InstallPlan {
    /// The run would not write anything.
    pub fn is_noop(&self) -> bool {
        matches!(
            self.action,
            InstallAction::UpToDate | InstallAction::NotInstalled
        )
    }
}

/// Overall health of an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    /// Current version recorded and everything in place
    Healthy,
    /// A different version is recorded
    Outdated,
    /// Current version recorded but required files or the managed section are gone
    Missing,
    NotInstalled,
}

/// Result of [`Orchestrator::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: InstallStatus,
    pub base_root: String,
    pub installed_version: Option<String>,
    pub target_version: String,
    /// Required destinations that do not exist, relative to the base root
    pub missing: Vec<String>,
    pub managed_section_present: bool,
    pub preferences_present: bool,
}

impl Orchestrator {
    /// Plan a run without fetching or writing anything.
    pub fn plan(&self, mode: SyncMode) -> Result<InstallPlan> {
        let state = self.versions.read();
        let action = self.decide(mode, &state);
        let mut plan = InstallPlan {
            action,
            installed_version: state.installed_version,
            target_version: self.catalog.version().to_string(),
            resources: Vec::new(),
            document_diff: String::new(),
            creates_preferences: false,
        };
        if plan.is_noop() {
            return Ok(plan);
        }

        plan.resources = self
            .catalog
            .resources()
            .map(|resource| {
                let destination = self.target.destination(resource);
                PlannedResource {
                    exists: destination.exists(),
                    resource: resource.clone(),
                    destination,
                }
            })
            .collect();
        plan.document_diff = self.document_diff()?;
        plan.creates_preferences =
            plan.action == InstallAction::FreshInstall && !self.target.preferences().exists();
        Ok(plan)
    }

    fn document_diff(&self) -> std::result::Result<String, MergeError> {
        let path = self.target.managed_document();
        let existing = io::read_optional(&path).map_err(|e| MergeError::unreadable(&path, &e))?;
        let merged = mine_blocks::merge(
            existing.as_deref(),
            MARKER,
            &render_managed(&self.catalog, &self.target),
        );

        let old = String::from_utf8_lossy(existing.as_deref().unwrap_or_default());
        let new = String::from_utf8_lossy(&merged);
        if old == new {
            return Ok(String::new());
        }
        Ok(TextDiff::from_lines(old.as_ref(), new.as_ref())
            .unified_diff()
            .context_radius(3)
            .header(path.as_str(), path.as_str())
            .to_string())
    }

    /// Inspect the installation without changing it.
    pub fn status(&self) -> StatusReport {
        let state = self.versions.read();
        let missing: Vec<String> = self
            .catalog
            .resources()
            .filter(|resource| !resource.optional)
            .filter(|resource| !self.target.destination(resource).is_file())
            .map(|resource| resource.relative_dest_path.clone())
            .collect();
        let managed_section_present = self.managed_section_present();

        let status = match state.installed_version.as_deref() {
            None => InstallStatus::NotInstalled,
            Some(installed) if installed != self.catalog.version() => InstallStatus::Outdated,
            Some(_) if !missing.is_empty() || !managed_section_present => InstallStatus::Missing,
            Some(_) => InstallStatus::Healthy,
        };

        StatusReport {
            status,
            base_root: self.target.base_root().to_string(),
            installed_version: state.installed_version,
            target_version: self.catalog.version().to_string(),
            missing,
            managed_section_present,
            preferences_present: self.target.preferences().exists(),
        }
    }
}
