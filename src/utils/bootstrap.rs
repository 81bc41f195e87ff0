//! Bootstrap utilities for querylog binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "QUERYLOG_LOG";

/// Initialize tracing with the QUERYLOG_LOG environment variable.
///
/// Defaults to "info" level if QUERYLOG_LOG is not set. Statement records
/// are emitted at debug level under the `querylog::sql` target, so
/// `QUERYLOG_LOG=querylog::sql=debug` shows them.
///
/// Library code never calls this; applications install their own
/// subscriber or call it once at startup.
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Like [`init_tracing`], with `default_filter` used when QUERYLOG_LOG is unset.
pub fn init_tracing_with_default(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
