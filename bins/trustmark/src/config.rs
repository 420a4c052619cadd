//! Configuration file loading
//!
//! Settings come from an optional TOML file. Secrets are never read from it;
//! they arrive through `--secret` or `TRUSTMARK_SECRET`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trustmark_crypto::event::DEFAULT_TOLERANCE_SECONDS;
use trustmark_telemetry::TelemetryConfig;

/// Files searched, in order, when `--config` is not given
const CANDIDATES: [&str; 3] = [".trustmark.toml", "trustmark.toml", ".config/trustmark.toml"];

/// Root configuration schema
///
/// Every section rejects unknown keys, so a `secret` anywhere in the file is
/// a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSchema {
    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub event: EventConfig,

    #[serde(default)]
    pub log: TelemetryConfig,
}

/// Token issuance defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// TTL used when `--ttl` is omitted
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_ttl_seconds(),
        }
    }
}

fn default_ttl_seconds() -> u64 {
    3600
}

/// Event verification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventConfig {
    /// Accepted clock skew for `--check-freshness`
    #[serde(default = "default_tolerance_seconds")]
    pub tolerance_seconds: u64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            tolerance_seconds: default_tolerance_seconds(),
        }
    }
}

fn default_tolerance_seconds() -> u64 {
    DEFAULT_TOLERANCE_SECONDS
}

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path, the first candidate file
    /// found in the working directory, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        let schema = match &config_path {
            Some(p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };
        schema.validate()?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }
}

impl ConfigSchema {
    /// Reject values the commands cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.token.default_ttl_seconds == 0 {
            bail!("token.default_ttl_seconds must be positive");
        }
        Ok(())
    }
}

fn find_config_file() -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}
