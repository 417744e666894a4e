//! Tracing subscriber setup for the `loo` binary.
//!
//! Stdout carries protocol lines only, so every log line goes to stderr.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "LOO_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. A second call is a no-op.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
