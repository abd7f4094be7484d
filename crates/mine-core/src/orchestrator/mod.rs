//! Sync orchestrator
//!
//! Composes the catalog, fetcher, writer, merger, preference bootstrapper
//! and version store into install, upgrade and uninstall runs.
//!
//! ```text
//! Idle -> Planning -> Fetching -> Writing -> Merging -> Finalizing -> Done
//! Idle -> Uninstalling -> Done
//! ```
//!
//! Only `Fetching` runs concurrently, on a bounded pool. Everything after it
//! happens sequentially under the install lock, and the version token is
//! always the last thing written.

mod plan;
mod uninstall;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use mine_fetch::{FetchError, Fetcher, RetryPolicy, fetch_with_retry};
use mine_fs::{InstallLock, io};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::catalog::{Catalog, GroupKind, ResourceDescriptor};
use crate::error::{FatalError, MergeError};
use crate::layout::InstallTarget;
use crate::preferences::{Preferences, ensure_defaults};
use crate::render::{MARKER, render_managed};
use crate::report::{DocumentOutcome, ErrorKind, OperationReport, RunOutcome};
use crate::version::{InstallAction, VersionState, VersionStore};

pub use plan::{InstallPlan, InstallStatus, PlannedResource, StatusReport};

/// Knobs for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// Maximum fetches in flight
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Run the full pipeline even when already up to date
    pub force: bool,
    /// Leave the preferences file behind on uninstall
    pub keep_preferences: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            retry: RetryPolicy::default(),
            force: false,
            keep_preferences: false,
        }
    }
}

/// Which entry point started the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Install,
    /// Like install, but only for an existing installation
    Upgrade,
}

type FetchKey = (GroupKind, String);
type FetchResult = Result<Vec<u8>, FetchError>;

fn key_of(resource: &ResourceDescriptor) -> FetchKey {
    let (group, name) = resource.identity();
    (group, name.to_string())
}

/// Drives runs against one install target.
pub struct Orchestrator {
    catalog: Catalog,
    target: InstallTarget,
    fetcher: Arc<dyn Fetcher>,
    options: SyncOptions,
    versions: VersionStore,
}

impl Orchestrator {
    pub fn new(
        catalog: Catalog,
        target: InstallTarget,
        fetcher: Arc<dyn Fetcher>,
        options: SyncOptions,
    ) -> Self {
        let versions = VersionStore::new(target.version_file());
        Self {
            catalog,
            target,
            fetcher,
            options,
            versions,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn target(&self) -> &InstallTarget {
        &self.target
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Install or refresh the catalog at the target.
    pub async fn install(&self) -> RunOutcome {
        self.install_until(std::future::pending()).await
    }

    /// Install, giving up cleanly if `cancel` resolves while fetching.
    ///
    /// Once writing starts the run always completes.
    pub async fn install_until(&self, cancel: impl Future<Output = ()>) -> RunOutcome {
        self.sync(SyncMode::Install, cancel).await
    }

    /// Upgrade an existing installation. Does nothing if none is recorded.
    pub async fn upgrade(&self) -> RunOutcome {
        self.upgrade_until(std::future::pending()).await
    }

    pub async fn upgrade_until(&self, cancel: impl Future<Output = ()>) -> RunOutcome {
        self.sync(SyncMode::Upgrade, cancel).await
    }

    /// Branch for this run, including the no-op short circuits.
    fn decide(&self, mode: SyncMode, state: &VersionState) -> InstallAction {
        match (mode, InstallAction::decide(state, self.catalog.version())) {
            (SyncMode::Upgrade, InstallAction::FreshInstall) => InstallAction::NotInstalled,
            (_, InstallAction::Reinstall) if !self.options.force && self.is_complete() => {
                InstallAction::UpToDate
            }
            (_, action) => action,
        }
    }

    /// Every required destination file is in place.
    ///
    /// A missing managed section alone does not trigger a reinstall; `status`
    /// reports it and `install --force` restores it.
    fn is_complete(&self) -> bool {
        self.catalog
            .resources()
            .filter(|resource| !resource.optional)
            .all(|resource| self.target.destination(resource).is_file())
    }

    fn managed_section_present(&self) -> bool {
        match io::read_optional(&self.target.managed_document()) {
            Ok(Some(bytes)) => mine_blocks::find_marker(&bytes, MARKER.as_bytes()).is_some(),
            _ => false,
        }
    }

    async fn sync(&self, mode: SyncMode, cancel: impl Future<Output = ()>) -> RunOutcome {
        let version = self.catalog.version();
        tracing::info!(?mode, version, root = %self.target.base_root(), "Planning");

        let state = self.versions.read();
        let action = self.decide(mode, &state);
        match action {
            InstallAction::NotInstalled => {
                tracing::info!("Nothing installed, nothing to upgrade");
                return RunOutcome::done(action, OperationReport::empty());
            }
            InstallAction::UpToDate => {
                tracing::info!(version, "Already up to date");
                return RunOutcome::done(action, OperationReport::all_skipped(self.catalog.resources()));
            }
            _ => {}
        }

        tracing::info!(?action, concurrency = self.options.concurrency, "Fetching");
        let handles = self.spawn_fetches();
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        let mut fetched = tokio::select! {
            fetched = join_fetches(handles) => fetched,
            () = cancel => {
                for abort in &aborts {
                    abort.abort();
                }
                tracing::warn!("Cancelled while fetching, nothing was written");
                return RunOutcome::cancelled(action);
            }
        };

        let mut report = OperationReport::empty();
        let lock_path = self.target.lock_file();
        let _lock = match InstallLock::acquire(&lock_path) {
            Ok(lock) => lock,
            Err(e) => return RunOutcome::fatal(FatalError::from_lock(e, &lock_path), action, report),
        };

        tracing::info!("Writing");
        self.write_all(&mut fetched, &mut report);

        tracing::info!("Merging");
        match self.merge_document() {
            Ok(outcome) => report.document = Some(outcome),
            Err(e) => return RunOutcome::fatal(FatalError::MergeFailed(e), action, report),
        }

        tracing::info!("Finalizing");
        if action == InstallAction::FreshInstall {
            let path = self.target.preferences();
            match ensure_defaults(&path, &Preferences::default()) {
                Ok(outcome) => report.preferences = Some(outcome),
                Err(e) => report.warn(format!("could not create preferences at {path}: {e}")),
            }
        }

        if report.has_required_failures() {
            let failed = report
                .failed
                .iter()
                .filter(|(resource, _)| !resource.optional)
                .count();
            report.warn(format!(
                "{failed} required resource(s) failed; installed version not recorded, re-run to finish"
            ));
        } else if let Err(e) = self.versions.write(version) {
            let error = FatalError::VersionStoreUnwritable {
                path: self.versions.path().to_native(),
                message: e.to_string(),
            };
            return RunOutcome::fatal(error, action, report);
        }

        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            skipped_optional = report.skipped_optional.len(),
            "Done"
        );
        RunOutcome::done(action, report)
    }

    fn spawn_fetches(&self) -> Vec<JoinHandle<(ResourceDescriptor, FetchResult)>> {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        self.catalog
            .resources()
            .cloned()
            .map(|resource| {
                let semaphore = Arc::clone(&semaphore);
                let fetcher = Arc::clone(&self.fetcher);
                let retry = self.options.retry.clone();
                tokio::spawn(async move {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return (resource, Err(FetchError::network("fetch pool closed"))),
                    };
                    let result = fetch_with_retry(&*fetcher, &resource.source_locator, &retry).await;
                    (resource, result)
                })
            })
            .collect()
    }

    /// Materialize fetched bytes, recording every outcome in `report`.
    ///
    /// Skill companions are handled after their primaries so a bundle whose
    /// primary failed is never left half-written.
    fn write_all(&self, fetched: &mut HashMap<FetchKey, FetchResult>, report: &mut OperationReport) {
        let (companions, others): (Vec<_>, Vec<_>) = self
            .catalog
            .resources()
            .partition(|resource| resource.bundle.is_some() && resource.optional);
        let mut broken_bundles: HashSet<&str> = HashSet::new();

        for resource in others.into_iter().chain(companions) {
            if let Some(bundle) = resource.bundle.as_deref()
                && resource.optional
                && broken_bundles.contains(bundle)
            {
                let kind = ErrorKind::BundleIncomplete {
                    bundle: bundle.to_string(),
                };
                report.record_failure(resource, kind);
                continue;
            }

            let result = fetched
                .remove(&key_of(resource))
                .unwrap_or_else(|| Err(FetchError::network("fetch task did not complete")));
            let failure = match result {
                Ok(bytes) => {
                    let destination = self.target.destination(resource);
                    match io::write_resource(&destination, &bytes) {
                        Ok(outcome) => {
                            tracing::debug!(resource = %resource, ?outcome, "Placed resource");
                            report.record_success(resource);
                            None
                        }
                        Err(e) => {
                            tracing::debug!(resource = %resource, error = %e, "Write failed");
                            Some(ErrorKind::Write(e.write_kind()))
                        }
                    }
                }
                Err(e) => Some(ErrorKind::Fetch(e)),
            };

            if let Some(kind) = failure {
                if resource.optional {
                    report.record_skipped_optional(resource, &kind);
                } else {
                    if let Some(bundle) = resource.bundle.as_deref() {
                        broken_bundles.insert(bundle);
                    }
                    report.record_failure(resource, kind);
                }
            }
        }
    }

    /// Replace the managed section of the shared document.
    fn merge_document(&self) -> Result<DocumentOutcome, MergeError> {
        let path = self.target.managed_document();
        let existing = io::read_optional(&path).map_err(|e| MergeError::unreadable(&path, &e))?;
        let merged = mine_blocks::merge(
            existing.as_deref(),
            MARKER,
            &render_managed(&self.catalog, &self.target),
        );

        let outcome = match existing {
            None => DocumentOutcome::Created,
            Some(bytes) if bytes == merged => return Ok(DocumentOutcome::Unchanged),
            Some(_) => DocumentOutcome::Updated,
        };
        io::write_atomic(&path, &merged).map_err(|e| MergeError::unwritable(&path, &e))?;
        tracing::debug!(path = %path, ?outcome, "Merged managed section");
        Ok(outcome)
    }
}

/// Collect fetch results keyed by resource identity, not completion order.
async fn join_fetches(
    handles: Vec<JoinHandle<(ResourceDescriptor, FetchResult)>>,
) -> HashMap<FetchKey, FetchResult> {
    let mut results = HashMap::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok((resource, result)) => {
                results.insert(key_of(&resource), result);
            }
            Err(e) => tracing::warn!(error = %e, "Fetch task failed"),
        }
    }
    results
}
