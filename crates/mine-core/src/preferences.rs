//! Preference bootstrapping
//!
//! The preferences file belongs to the user once it exists. Install only
//! creates it when absent and never reads, validates or rewrites it.

use mine_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

/// Result of [`ensure_defaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapOutcome {
    Created,
    AlreadyPresent,
}

/// Default preferences written on first install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub schema_version: u32,
    pub response_style: String,
    pub auto_update_knowledge: bool,
    pub confirm_destructive_actions: bool,
    pub preferred_workflows: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            schema_version: 1,
            response_style: "concise".to_string(),
            auto_update_knowledge: true,
            confirm_destructive_actions: true,
            preferred_workflows: vec!["plan".to_string(), "implement".to_string()],
        }
    }
}

/// Write `defaults` to `path` only if nothing exists there yet.
pub fn ensure_defaults<T: Serialize>(
    path: &NormalizedPath,
    defaults: &T,
) -> mine_fs::Result<BootstrapOutcome> {
    if path.exists() {
        tracing::debug!(path = %path, "Preferences already present");
        return Ok(BootstrapOutcome::AlreadyPresent);
    }
    ConfigStore::new().save(path, defaults)?;
    tracing::info!(path = %path, "Created default preferences");
    Ok(BootstrapOutcome::Created)
}
