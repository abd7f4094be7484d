//! Per-run outcome reporting
//!
//! Per-resource failures never abort a run. They are collected into an
//! [`OperationReport`] that travels with the run's terminal status.

use std::fmt;

use mine_fetch::FetchError;
use mine_fs::WriteErrorKind;

use crate::catalog::ResourceDescriptor;
use crate::error::FatalError;
use crate::preferences::BootstrapOutcome;
use crate::version::InstallAction;

/// Why one resource did not make it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch(FetchError),
    Write(WriteErrorKind),
    /// The skill's primary file failed, so this companion was not written
    BundleIncomplete { bundle: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed: {e}"),
            Self::Write(kind) => write!(f, "{kind}"),
            Self::BundleIncomplete { bundle } => {
                write!(f, "skill {bundle} is incomplete without its primary file")
            }
        }
    }
}

/// What happened to the shared instruction document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    Created,
    Updated,
    Unchanged,
    /// Managed section removed, user content kept
    Stripped,
    /// Only the managed section was left, so the file was removed
    Deleted,
    /// No marker found, nothing to remove
    Untouched,
    Absent,
}

/// Aggregate result of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationReport {
    pub succeeded: Vec<ResourceDescriptor>,
    pub failed: Vec<(ResourceDescriptor, ErrorKind)>,
    pub skipped_optional: Vec<ResourceDescriptor>,
    /// Resources left alone: already current, or nothing to remove
    pub skipped: Vec<ResourceDescriptor>,
    pub document: Option<DocumentOutcome>,
    pub preferences: Option<BootstrapOutcome>,
    pub warnings: Vec<String>,
}

impl OperationReport {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A report where every resource was skipped.
    pub fn all_skipped<'a>(resources: impl IntoIterator<Item = &'a ResourceDescriptor>) -> Self {
        Self {
            skipped: resources.into_iter().cloned().collect(),
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, resource: &ResourceDescriptor) {
        self.succeeded.push(resource.clone());
    }

    pub fn record_failure(&mut self, resource: &ResourceDescriptor, kind: ErrorKind) {
        tracing::warn!(resource = %resource, error = %kind, "Resource failed");
        self.failed.push((resource.clone(), kind));
    }

    pub fn record_skipped_optional(&mut self, resource: &ResourceDescriptor, reason: &dyn fmt::Display) {
        tracing::debug!(resource = %resource, %reason, "Skipped optional resource");
        self.skipped_optional.push(resource.clone());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Whether any non-optional resource failed.
    pub fn has_required_failures(&self) -> bool {
        self.failed.iter().any(|(resource, _)| !resource.optional)
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failure_for(&self, name: &str) -> Option<&ErrorKind> {
        self.failed
            .iter()
            .find(|(resource, _)| resource.name == name)
            .map(|(_, kind)| kind)
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Done,
    Fatal(FatalError),
    /// Interrupted before anything was written
    Cancelled,
}

/// Terminal status, the branch taken and the accumulated report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub action: InstallAction,
    pub report: OperationReport,
}

impl RunOutcome {
    pub fn done(action: InstallAction, report: OperationReport) -> Self {
        Self {
            status: RunStatus::Done,
            action,
            report,
        }
    }

    pub fn fatal(error: FatalError, action: InstallAction, report: OperationReport) -> Self {
        tracing::error!(%error, "Run aborted");
        Self {
            status: RunStatus::Fatal(error),
            action,
            report,
        }
    }

    pub fn cancelled(action: InstallAction) -> Self {
        Self {
            status: RunStatus::Cancelled,
            action,
            report: OperationReport::empty(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == RunStatus::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GroupKind;

    fn resource(name: &str, optional: bool) -> ResourceDescriptor {
        ResourceDescriptor {
            group: GroupKind::Workflows,
            name: name.to_string(),
            source_locator: format!("/m/workflows/{name}"),
            relative_dest_path: format!("global_workflows/{name}"),
            optional,
            bundle: None,
        }
    }

    #[test]
    fn optional_failures_are_not_required_failures() {
        let mut report = OperationReport::empty();
        report.record_failure(
            &resource("extra.md", true),
            ErrorKind::BundleIncomplete {
                bundle: "x".into(),
            },
        );
        assert!(!report.has_required_failures());
        assert!(!report.is_clean());

        report.record_failure(&resource("plan.md", false), ErrorKind::Fetch(FetchError::Timeout));
        assert!(report.has_required_failures());
        assert_eq!(
            report.failure_for("plan.md"),
            Some(&ErrorKind::Fetch(FetchError::Timeout))
        );
    }
}
