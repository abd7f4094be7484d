//! Run configuration with layered resolution
//!
//! Values are resolved from, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. User config (`<config_dir>/mine/config.toml`)
//! 3. Explicit overrides (environment and command-line flags, bound by the CLI)

use std::path::{Path, PathBuf};
use std::time::Duration;

use mine_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::orchestrator::SyncOptions;
use crate::{Error, Result};

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Install base root; defaults to `<home>/.codeium/windsurf`
    pub base_root: Option<PathBuf>,
    /// Resource source URL or local mirror; defaults to the catalog's own
    pub source: Option<String>,
    /// Catalog override file
    pub catalog: Option<PathBuf>,
    pub concurrency: usize,
    pub fetch_timeout_secs: u64,
    pub keep_preferences: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_root: None,
            source: None,
            catalog: None,
            concurrency: 4,
            fetch_timeout_secs: 10,
            keep_preferences: false,
        }
    }
}

/// Highest-precedence values, typically from flags and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub base_root: Option<PathBuf>,
    pub source: Option<String>,
    pub catalog: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub fetch_timeout_secs: Option<u64>,
    pub keep_preferences: Option<bool>,
}

impl SyncConfig {
    /// Platform config file location, e.g. `~/.config/mine/config.toml`.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mine").join("config.toml"))
    }

    /// Load the user config layer on top of defaults.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            tracing::debug!(?path, "No user config found, using defaults");
            return Ok(Self::default());
        }
        tracing::debug!(?path, "Loading user config");
        Ok(ConfigStore::new().load(&NormalizedPath::new(path))?)
    }

    /// Defaults plus the user config at its platform location.
    pub fn load() -> Result<Self> {
        match Self::user_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Apply the highest-precedence layer.
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if overrides.base_root.is_some() {
            self.base_root = overrides.base_root;
        }
        if overrides.source.is_some() {
            self.source = overrides.source;
        }
        if overrides.catalog.is_some() {
            self.catalog = overrides.catalog;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout) = overrides.fetch_timeout_secs {
            self.fetch_timeout_secs = timeout;
        }
        if let Some(keep) = overrides.keep_preferences {
            self.keep_preferences = keep;
        }
        self
    }

    /// Check values that have no sensible interpretation.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config {
                message: "concurrency must be at least 1".into(),
            });
        }
        if self.fetch_timeout_secs == 0 {
            return Err(Error::Config {
                message: "fetch timeout must be at least 1 second".into(),
            });
        }
        Ok(())
    }

    /// The base root to install into.
    pub fn resolved_base_root(&self) -> Result<NormalizedPath> {
        match &self.base_root {
            Some(root) => Ok(NormalizedPath::resolve(root)),
            None => dirs::home_dir()
                .map(|home| NormalizedPath::new(home.join(".codeium").join("windsurf")))
                .ok_or_else(|| Error::Config {
                    message: "cannot determine home directory; pass --root".into(),
                }),
        }
    }

    /// The configured catalog override, or the built-in catalog.
    pub fn load_catalog(&self) -> Result<Catalog> {
        let source = self.source.as_deref();
        match &self.catalog {
            Some(path) => Catalog::load(&NormalizedPath::resolve(path), source),
            None => Catalog::builtin(source),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn sync_options(&self) -> SyncOptions {
        let defaults = SyncOptions::default();
        SyncOptions {
            concurrency: self.concurrency,
            retry: defaults.retry.clone().with_timeout(self.fetch_timeout()),
            keep_preferences: self.keep_preferences,
            ..defaults
        }
    }
}
