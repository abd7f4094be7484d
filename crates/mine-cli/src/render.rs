//! Terminal rendering of run outcomes and plans

use colored::Colorize;
use mine_core::{
    DocumentOutcome, InstallAction, InstallPlan, OperationReport, RunOutcome, RunStatus,
    VersionChange, compare_versions,
};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CANCELLED: i32 = 130;

/// Headline for the branch a run took.
pub fn describe_action(action: &InstallAction, target_version: &str) -> String {
    match action {
        InstallAction::FreshInstall => format!("Installing {target_version}"),
        InstallAction::Upgrade { from } => match compare_versions(from, target_version) {
            VersionChange::Older => format!("Downgrading {from} -> {target_version}"),
            _ => format!("Upgrading {from} -> {target_version}"),
        },
        InstallAction::Reinstall => format!("Reinstalling {target_version}"),
        InstallAction::UpToDate => format!("Already up to date ({target_version})"),
        InstallAction::NotInstalled => "Nothing installed; run `mine install` first".to_string(),
        InstallAction::Uninstall => "Uninstalling".to_string(),
    }
}

/// Print the outcome of a run and return the process exit code.
pub fn print_outcome(outcome: &RunOutcome, target_version: &str) -> i32 {
    println!(
        "{} {}",
        "=>".blue().bold(),
        describe_action(&outcome.action, target_version)
    );
    print_report(&outcome.report);

    match &outcome.status {
        RunStatus::Done if outcome.report.is_clean() => {
            println!("{}", "OK".green().bold());
            EXIT_OK
        }
        RunStatus::Done => {
            println!(
                "{} finished with {} failed resource(s); re-run to retry",
                "WARN".yellow().bold(),
                outcome.report.failed.len()
            );
            EXIT_OK
        }
        RunStatus::Fatal(error) => {
            eprintln!("{}: {}", "error".red().bold(), error);
            eprintln!("Re-run the command rather than editing managed files by hand.");
            EXIT_FAILED
        }
        RunStatus::Cancelled => {
            println!("{} nothing was written", "Cancelled:".yellow().bold());
            EXIT_CANCELLED
        }
    }
}

fn print_report(report: &OperationReport) {
    if !report.succeeded.is_empty() {
        println!("   {} {} resource(s)", "+".green(), report.succeeded.len());
    }
    if !report.skipped.is_empty() {
        println!("   {} {} unchanged", "=".dimmed(), report.skipped.len());
    }
    for resource in &report.skipped_optional {
        println!("   {} {} (optional, skipped)", "-".yellow(), resource);
    }
    for (resource, kind) in &report.failed {
        println!("   {} {}: {}", "x".red().bold(), resource, kind);
    }
    if let Some(document) = report.document {
        let text = match document {
            DocumentOutcome::Created => "created",
            DocumentOutcome::Updated => "updated",
            DocumentOutcome::Unchanged => "unchanged",
            DocumentOutcome::Stripped => "managed section removed",
            DocumentOutcome::Deleted => "removed",
            DocumentOutcome::Untouched => "left untouched (no managed section)",
            DocumentOutcome::Absent => "not present",
        };
        println!("   {} rules: {}", "*".cyan(), text);
    }
    for warning in &report.warnings {
        println!("   {} {}", "!".yellow().bold(), warning);
    }
}

/// Print a dry-run plan.
pub fn print_plan(plan: &InstallPlan) {
    println!(
        "{} {} {}",
        "=>".blue().bold(),
        "[dry-run]".dimmed(),
        describe_action(&plan.action, &plan.target_version)
    );
    if plan.is_noop() {
        return;
    }

    for planned in &plan.resources {
        let verb = if planned.exists { "update" } else { "create" };
        let optional = if planned.resource.optional {
            " (optional)"
        } else {
            ""
        };
        println!(
            "   Would {} {}{}",
            verb,
            planned.destination.as_str().cyan(),
            optional
        );
    }
    if plan.creates_preferences {
        println!("   Would create default preferences");
    }
    if plan.document_diff.is_empty() {
        println!("   Rules document unchanged");
    } else {
        println!();
        for line in plan.document_diff.lines() {
            if line.starts_with('+') && !line.starts_with("+++") {
                println!("{}", line.green());
            } else if line.starts_with('-') && !line.starts_with("---") {
                println!("{}", line.red());
            } else {
                println!("{line}");
            }
        }
    }
}
