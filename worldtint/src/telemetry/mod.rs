//! Logging bootstrap.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Events go to stderr at `info` and above; `RUST_LOG` overrides the
/// filter. Call once at process start; a second call panics, as the
/// global subscriber can only be set once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
