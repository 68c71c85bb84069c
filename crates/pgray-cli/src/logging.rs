//! Logging setup for the `pgray` binary
//!
//! Diagnostics go to stderr so stdout carries only the rendered plan.
//! `RUST_LOG` takes precedence over the built-in filter.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "warn".to_string(),
            json: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Configuration for `--verbose`: plan parsing at debug level
    pub fn verbose() -> Self {
        Self {
            default_filter: "warn,pgray=debug,pgray_plan=debug".to_string(),
            include_location: true,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Installs the global subscriber
pub fn init(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = config.env_filter();

    let layer = if config.json {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_ansi(false)
            .json()
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_location)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    tracing::debug!(filter = %config.default_filter, json = config.json, "Logging initialized");
    Ok(())
}
