use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,courseboard=debug";

/// Sends structured logs to stderr so listings written to stdout stay clean.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
