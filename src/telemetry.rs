//! Telemetry initialization.
//!
//! Log output goes to stderr so the merged documents and interactive
//! prompts on stdout stay clean. `RUST_LOG` overrides the default level;
//! `--debug` raises the fallback from `info` to `debug`.

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber for this process.
pub fn init(debug: bool) {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let fallback = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
