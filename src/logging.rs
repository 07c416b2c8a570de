//! Diagnostics for plugin authors.
//!
//! Stdout belongs to the scheduler, so log output always goes to stderr. The filter comes from
//! `CHECKKIT_LOG` if set, otherwise from the number of `-v` flags.

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter, e.g. `CHECKKIT_LOG=checkkit=trace`.
pub const LOG_ENV: &str = "CHECKKIT_LOG";

pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. Calling it twice keeps the first one.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
