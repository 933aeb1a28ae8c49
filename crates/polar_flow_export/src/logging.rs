use tracing_subscriber::EnvFilter;

/// Used when the requested filter does not parse.
pub const FALLBACK_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Requested level plus per-target overrides that keep the HTTP stack quiet.
pub fn filter_directive(level: &str) -> String {
    format!("{},hyper=warn,reqwest=warn", level)
}

pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(filter_directive(level)).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Install the global subscriber. Logs go to stderr so stdout only carries the
/// export report.
pub fn init(level: &str) {
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(level))
        .init();
    tracing::debug!("log filter: {}", filter_directive(level));
}
