//! Repair command

use std::path::Path;

use colored::Colorize;
use mine_core::{GroupKind, RecoveryOutcome, recover_state_file};
use mine_fs::{NormalizedPath, validate_relative_path};

use crate::context::Context;
use crate::error::{CliError, Result};
use crate::render;

/// Back up and recreate `file` from an installed template when it is malformed.
pub fn run_repair(ctx: &Context, file: &Path, template: &str) -> Result<i32> {
    validate_relative_path(template, "template").map_err(CliError::user)?;

    let target = ctx.target()?;
    let template_path = target.group_root(GroupKind::Templates).join(template);
    let state_path = NormalizedPath::resolve(file);

    match recover_state_file(&state_path, &template_path)? {
        RecoveryOutcome::Healthy => {
            println!("{} {} is well formed", "OK".green().bold(), state_path);
        }
        RecoveryOutcome::Created => {
            println!(
                "{} created {} from {}",
                "+".green(),
                state_path,
                template.cyan()
            );
        }
        RecoveryOutcome::Recovered { backup } => {
            println!(
                "{} {} was malformed; backed up to {} and recreated",
                "!".yellow().bold(),
                state_path,
                backup
            );
        }
    }
    Ok(render::EXIT_OK)
}
