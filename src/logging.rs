//! Logging configuration for db-relay.
//!
//! Diagnostics go to stderr so that the payload on stdout stays clean for
//! the invoking workflow host. The filter defaults to `info` and can be
//! overridden with `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Initializes stderr logging with an environment-controlled filter.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
