//! Tracing setup for the player binary
//!
//! Logs go to stderr so they do not interleave with shell output on stdout.

use crate::config::LoggingSettings;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` if set, else the configured directives
pub fn filter(settings: &LoggingSettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&settings.filter)?),
    }
}

/// Install the global subscriber
pub fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(filter(settings)?)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()?;
    Ok(())
}
