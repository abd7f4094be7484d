//! Command implementations for mine-cli

pub mod install;
pub mod repair;
pub mod status;
pub mod uninstall;

pub use install::{SyncCommand, run_sync};
pub use repair::run_repair;
pub use status::run_status;
pub use uninstall::run_uninstall;
