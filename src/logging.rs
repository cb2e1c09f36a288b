//! Console logging for binaries built on the runtime

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable read for the log filter.
pub const LOG_ENV: &str = "AUGUR_LOG";

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a console subscriber filtered by `AUGUR_LOG` (default `info`).
/// Safe to call more than once; an existing global subscriber is left alone.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(log_filter()),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already set; keeping it");
        }
    });
}
