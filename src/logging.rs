//! Logging setup
//!
//! The crate logs through `tracing`; these helpers install a subscriber for
//! binaries and tests that want to see it. `RUST_LOG` overrides the default
//! filter.

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "hookchain=info";

/// Build the env filter, falling back to [`DEFAULT_FILTER`]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to stderr
pub fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Log to stderr and to a daily-rolling file in `dir`
///
/// Keep the returned guard alive for as long as file logging should flush.
pub fn init_file_logging(dir: impl AsRef<Path>) -> Result<WorkerGuard> {
    let appender = tracing_appender::rolling::daily(dir.as_ref(), "hookchain.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;

    tracing::info!("File logging enabled in {:?}", dir.as_ref());
    Ok(guard)
}
