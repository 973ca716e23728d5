//! Logging setup for binaries built on this crate.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging at `warn` unless `RUST_LOG` says otherwise.
pub fn init() {
    init_with_level("warn")
}

/// Initialize logging with a specific default level.
///
/// `RUST_LOG` still overrides `default_level`. Output goes to stderr so it
/// never mixes with rendered command output.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
