//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use mine_core::ConfigOverrides;

/// mine - install and keep AI assistant rules, workflows and skills in sync
#[derive(Parser, Debug)]
#[command(name = "mine")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Install base root [default: ~/.codeium/windsurf]
    #[arg(long, global = true, env = "MINE_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Resource source: an http(s) URL or a local mirror directory
    #[arg(long, global = true, env = "MINE_SOURCE", value_name = "URL|DIR")]
    pub source: Option<String>,

    /// Catalog file replacing the built-in catalog (.toml, .json or .yaml)
    #[arg(long, global = true, env = "MINE_CATALOG", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// User config file [default: <config dir>/mine/config.toml]
    #[arg(long, global = true, env = "MINE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum concurrent downloads
    #[arg(long, global = true, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Install or refresh resources and the managed rules section
    Install {
        /// Reinstall even if the recorded version is current
        #[arg(long)]
        force: bool,

        /// Show what would change without fetching or writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Upgrade an existing installation to the catalog version
    Upgrade {
        /// Show what would change without fetching or writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove installed resources and the managed rules section
    Uninstall {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Leave the preferences file in place
        #[arg(long)]
        keep_preferences: bool,
    },

    /// Show installation status
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Back up and recreate a malformed state file from a template
    ///
    /// Examples:
    ///   mine repair ~/.codeium/session_store.json --template session_store.json
    Repair {
        /// State file to check
        file: PathBuf,

        /// Template name inside the installed templates directory
        #[arg(long)]
        template: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Flag and environment values, the highest configuration layer.
    pub fn overrides(&self) -> ConfigOverrides {
        let keep_preferences = match &self.command {
            Commands::Uninstall {
                keep_preferences: true,
                ..
            } => Some(true),
            _ => None,
        };
        ConfigOverrides {
            base_root: self.root.clone(),
            source: self.source.clone(),
            catalog: self.catalog.clone(),
            concurrency: self.concurrency,
            fetch_timeout_secs: self.timeout,
            keep_preferences,
        }
    }
}
