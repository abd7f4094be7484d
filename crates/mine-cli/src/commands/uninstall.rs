//! Uninstall command

use std::io::IsTerminal;

use colored::Colorize;
use dialoguer::Confirm;

use crate::context::Context;
use crate::error::{CliError, Result};
use crate::render;

/// Remove everything mine installed under the base root.
///
/// Asks for confirmation on an interactive terminal unless `--yes` is given.
pub fn run_uninstall(ctx: &Context, yes: bool) -> Result<i32> {
    let orchestrator = ctx.orchestrator(false)?;
    let base_root = orchestrator.target().base_root().clone();

    if !yes && std::io::stdin().is_terminal() {
        let proceed = Confirm::new()
            .with_prompt(format!("Remove mine resources from {}?", base_root))
            .default(false)
            .interact()?;
        if !proceed {
            return Err(CliError::user("Uninstall cancelled by user."));
        }
    }

    let outcome = orchestrator.uninstall();
    let code = render::print_outcome(&outcome, orchestrator.catalog().version());
    if outcome.is_done() && orchestrator.options().keep_preferences {
        println!("   {} preferences kept", "=".dimmed());
    }
    Ok(code)
}
