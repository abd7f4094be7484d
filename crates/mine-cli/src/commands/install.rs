//! Install and upgrade commands

use mine_core::SyncMode;

use crate::context::Context;
use crate::error::Result;
use crate::render;

/// Which synchronization the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    Install { force: bool },
    Upgrade,
}

impl SyncCommand {
    fn mode(self) -> SyncMode {
        match self {
            Self::Install { .. } => SyncMode::Install,
            Self::Upgrade => SyncMode::Upgrade,
        }
    }

    fn force(self) -> bool {
        matches!(self, Self::Install { force: true })
    }
}

/// Run install or upgrade, or print the plan for `--dry-run`.
///
/// Ctrl-C before the write phase cancels the run with nothing written.
pub async fn run_sync(ctx: &Context, command: SyncCommand, dry_run: bool) -> Result<i32> {
    let orchestrator = ctx.orchestrator(command.force())?;
    let target_version = orchestrator.catalog().version().to_string();

    if dry_run {
        let plan = orchestrator.plan(command.mode())?;
        render::print_plan(&plan);
        return Ok(render::EXIT_OK);
    }

    let outcome = match command {
        SyncCommand::Install { .. } => orchestrator.install_until(interrupted()).await,
        SyncCommand::Upgrade => orchestrator.upgrade_until(interrupted()).await,
    };
    Ok(render::print_outcome(&outcome, &target_version))
}

async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; never cancel
        std::future::pending::<()>().await;
    }
    tracing::debug!("Interrupt received");
}
