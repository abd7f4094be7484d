//! Resource synchronization engine for mine
//!
//! This crate reconciles a declared catalog of resources against a local
//! install target:
//!
//! - **Catalog**: the resources to install and their target version
//! - **Layout**: every path derived from one base root
//! - **Version store**: the single token that records what is installed
//! - **Orchestrator**: install, upgrade, uninstall, plan and status
//! - **Recovery**: backup-and-recreate for malformed state files
//!
//! # Architecture
//!
//! ```text
//!                  mine-cli
//!                     |
//!                 mine-core
//!                     |
//!        +------------+------------+
//!        |            |            |
//!     mine-fs    mine-blocks   mine-fetch
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod layout;
pub mod orchestrator;
pub mod preferences;
pub mod recovery;
pub mod render;
pub mod report;
pub mod version;

pub use catalog::{Catalog, CatalogFile, GroupKind, ResourceDescriptor, ResourceGroup};
pub use config::{ConfigOverrides, SyncConfig};
pub use error::{Error, FatalError, MergeError, Result};
pub use layout::InstallTarget;
pub use orchestrator::{
    InstallPlan, InstallStatus, Orchestrator, PlannedResource, StatusReport, SyncMode, SyncOptions,
};
pub use preferences::{BootstrapOutcome, Preferences, ensure_defaults};
pub use recovery::{RecoveryOutcome, recover_state_file};
pub use render::{MARKER, render_managed};
pub use report::{DocumentOutcome, ErrorKind, OperationReport, RunOutcome, RunStatus};
pub use version::{InstallAction, VersionChange, VersionState, VersionStore, compare_versions};
