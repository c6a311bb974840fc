//! Logging setup
//!
//! Diagnostics go to stderr; stdout is reserved for the decision record, so a
//! host parsing our output never sees log lines mixed into the wire protocol.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Filter defaults to `toolgate=info` and can be overridden with `RUST_LOG`.
/// Safe to call once per process; returns an error if a global subscriber is
/// already installed.
pub fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("toolgate=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {}", e))?;

    Ok(())
}
