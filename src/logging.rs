use std::fs::OpenOptions;

use anyhow::Context as _;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`. Output goes to
/// stderr, or is appended to `config.file` when one is set.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .with_context(|| format!("invalid log filter '{}'", config.filter))?;

    let registry = tracing_subscriber::registry().with(filter);

    match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file '{}'", path.display()))?;
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_timer(UtcTime::rfc_3339());
            registry.with(file_layer).try_init()?;
        }
        None => {
            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_timer(UtcTime::rfc_3339());
            registry.with(stderr_layer).try_init()?;
        }
    }

    Ok(())
}
