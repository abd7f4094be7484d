//! Status command implementation

use colored::Colorize;
use mine_core::{InstallStatus, StatusReport};

use crate::context::Context;
use crate::error::Result;
use crate::render;

/// Print installation health, or JSON with `--json`.
pub fn run_status(ctx: &Context, json: bool) -> Result<i32> {
    let orchestrator = ctx.orchestrator(false)?;
    let report = orchestrator.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_status(&report);
    }
    Ok(render::EXIT_OK)
}

fn print_status(report: &StatusReport) {
    println!("{}", "mine status".bold());
    println!();

    let status = match report.status {
        InstallStatus::Healthy => "healthy".green(),
        InstallStatus::Outdated => "outdated".yellow(),
        InstallStatus::Missing => "incomplete".red(),
        InstallStatus::NotInstalled => "not installed".dimmed(),
    };
    println!("{}:      {}", "Status".dimmed(), status);
    println!("{}:   {}", "Base root".dimmed(), report.base_root);
    println!(
        "{}:   {}",
        "Installed".dimmed(),
        report.installed_version.as_deref().unwrap_or("-")
    );
    println!("{}:     {}", "Catalog".dimmed(), report.target_version.cyan());
    println!(
        "{}:       {}",
        "Rules".dimmed(),
        if report.managed_section_present {
            "managed section present".green()
        } else {
            "no managed section".yellow()
        }
    );

    if !report.missing.is_empty() {
        println!();
        println!("{}:", "Missing".bold());
        for path in &report.missing {
            println!("  {} {}", "x".red(), path);
        }
    }

    match report.status {
        InstallStatus::NotInstalled => {
            println!();
            println!("Run {} to install.", "mine install".cyan());
        }
        InstallStatus::Outdated => {
            println!();
            println!("Run {} to update.", "mine upgrade".cyan());
        }
        InstallStatus::Missing => {
            println!();
            println!("Run {} to restore.", "mine install --force".cyan());
        }
        InstallStatus::Healthy => {}
    }
}
