use tracing_subscriber::{fmt, EnvFilter};

/// Send `tracing` output to stderr so stdout carries only the report.
///
/// Default: info for this crate, warn for everything else; `verbose` raises
/// this crate to debug. `RUST_LOG` overrides both.
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,slack_digest={level}")));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
