//! Tracing subscriber set-up for the `scw-converge` binary.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{prelude::*, registry};

/// Installs the global subscriber: human-readable events on stderr, filtered
/// by `RUST_LOG` and defaulting to `info`.
///
/// Stdout stays reserved for command results.
///
/// # Errors
///
/// Returns [`TryInitError`] when a global subscriber is already installed.
pub fn init() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    registry().with(fmt_layer).try_init()
}
