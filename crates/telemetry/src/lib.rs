//! Structured logging for Trustmark tools
//!
//! Installs a `tracing` subscriber writing to stderr so that stdout stays
//! reserved for command output. `RUST_LOG` overrides the configured level.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Per-process session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging with default configuration
pub fn init() -> anyhow::Result<()> {
    init_with_config(&TelemetryConfig::default())
}

/// Initialize with custom configuration
pub fn init_with_config(config: &TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(config.show_target))
            .try_init()
    } else {
        registry
            .with(fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(config.show_target))
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Level or filter directive (`warn`, `trustmark=debug`, ...)
    pub level: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
    /// Include the event target
    pub show_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            show_target: false,
        }
    }
}

impl TelemetryConfig {
    /// Raise the level to `debug` regardless of the configured value.
    pub fn verbose(mut self) -> Self {
        self.level = "debug".to_string();
        self
    }

    /// Directive handed to `EnvFilter` when `RUST_LOG` is unset.
    pub fn filter_directive(&self) -> &str {
        let level = self.level.trim();
        if level.is_empty() { "warn" } else { level }
    }
}
