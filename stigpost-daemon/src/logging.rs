//! Logging initialization for stigpost-daemon.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `StigpostConfig`: JSON lines for production, pretty output for
//! development.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use stigpost_core::config::GeneralConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Pick the fmt layer for a `log_format` value.
fn format_layer(log_format: &str) -> Result<BoxedLayer> {
    match log_format {
        "json" => Ok(fmt::layer().json().boxed()),
        "pretty" => Ok(fmt::layer().pretty().boxed()),
        other => Err(anyhow::anyhow!(
            "unknown log format '{}', expected 'json' or 'pretty'",
            other
        )),
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once, before any tracing macro fires. `RUST_LOG` wins over
/// `log_level` when set.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(format_layer(&config.log_format)?)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))
}
