//! Tracing initialisation for the command-line runner.

use crate::verbosity::Verbosity;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Overrides the filter directive derived from the verbosity, e.g.
/// `SHELL_SCRIPT_LOG=shell_script=trace`.
pub const LOG_FILTER_ENV: &str = "SHELL_SCRIPT_LOG";

/// Install a stderr subscriber. Call once at process startup; later calls
/// are ignored.
pub fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.level_filter().to_string()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}
