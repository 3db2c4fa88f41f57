//! Tracing setup

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Install the global fmt subscriber
///
/// `RUST_LOG` overrides `filter`; an unparseable `filter` falls back to
/// `info`. Returns `false` when a subscriber was already installed.
pub fn init_tracing(filter: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(false)
            .with_env_filter(filter)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(?format, "tracing initialised");
    }
    installed
}
