//! Tracing setup shared by both binaries.

use tracing_subscriber::{prelude::*, EnvFilter};

const DEFAULT_LEVEL: &str = "warn";

/// Initialize tracing. Call once at process startup.
///
/// Logs go to stderr so the stdout report stays untouched. `RUST_LOG`
/// overrides the default `warn` level.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init();
}
