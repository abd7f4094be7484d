//! mine CLI
//!
//! Installs, upgrades and removes the managed rules, workflows and skills
//! for an AI coding assistant.

mod cli;
mod commands;
mod context;
mod error;
mod logging;
mod render;

use clap::{CommandFactory, Parser};
use colored::Colorize;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(render::EXIT_FAILED);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "mine", &mut std::io::stdout());
        return Ok(render::EXIT_OK);
    }

    let ctx = Context::resolve(&cli)?;
    match cli.command {
        Commands::Install { force, dry_run } => {
            commands::run_sync(&ctx, commands::SyncCommand::Install { force }, dry_run).await
        }
        Commands::Upgrade { dry_run } => {
            commands::run_sync(&ctx, commands::SyncCommand::Upgrade, dry_run).await
        }
        Commands::Uninstall { yes, .. } => commands::run_uninstall(&ctx, yes),
        Commands::Status { json } => commands::run_status(&ctx, json),
        Commands::Repair { file, template } => commands::run_repair(&ctx, &file, &template),
        Commands::Completions { .. } => Ok(render::EXIT_OK),
    }
}
