//! Tracing subscriber setup

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{CliError, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise only warnings are shown, or
/// everything from debug up with `--verbose`. Logs go to stderr so they
/// never mix with `--json` output.
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| CliError::user(format!("invalid log filter: {e}")))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| CliError::user(format!("could not initialise logging: {e}")))?;

    tracing::debug!("Verbose mode enabled");
    Ok(())
}
