use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `DIRSORT_LOG=dirsort=trace`.
pub const LOG_ENV: &str = "DIRSORT_LOG";

/// Installs the global tracing subscriber, writing to stderr without timestamps.
///
/// `DIRSORT_LOG` wins when set; otherwise the level is `warn`, or `debug` when `verbose`.
/// Calling this more than once keeps the first subscriber.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
