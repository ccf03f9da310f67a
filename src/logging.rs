//! Tracing subscriber setup for the CLI and tests.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (normally the
/// configured `application.log_level`) applies to the whole crate. Calling
/// this twice keeps the first subscriber, so tests can initialize freely.
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing already initialized; keeping the existing subscriber");
    }
}
