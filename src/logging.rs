use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter, e.g. `RSYNCR_LOG=trace`.
pub const LOG_ENV: &str = "RSYNCR_LOG";

/// Diagnostics go to stderr, so stdout only carries the change summary.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
