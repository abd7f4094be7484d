//! Resolved configuration and orchestrator construction

use mine_core::{InstallTarget, Orchestrator, SyncConfig, SyncOptions};

use crate::cli::Cli;
use crate::error::Result;

/// Everything a command needs, resolved once per invocation.
pub struct Context {
    pub config: SyncConfig,
}

impl Context {
    /// Layer defaults, the user config file and flags/environment.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file_layer = match &cli.config {
            Some(path) => SyncConfig::load_from(path)?,
            None => SyncConfig::load()?,
        };
        let config = file_layer.apply(cli.overrides());
        config.validate()?;
        tracing::debug!(?config, "Resolved configuration");
        Ok(Self { config })
    }

    pub fn target(&self) -> Result<InstallTarget> {
        Ok(InstallTarget::new(self.config.resolved_base_root()?))
    }

    /// Build an orchestrator with the transport chosen by the source.
    pub fn orchestrator(&self, force: bool) -> Result<Orchestrator> {
        let catalog = self.config.load_catalog()?;
        let fetcher = mine_fetch::fetcher_for(catalog.source())?;
        let options = SyncOptions {
            force,
            ..self.config.sync_options()
        };
        Ok(Orchestrator::new(catalog, self.target()?, fetcher, options))
    }
}
