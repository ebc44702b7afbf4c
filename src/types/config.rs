//! Configuration structures.
//!
//! Configuration is resolved once, up front: every field carries a default so
//! a partially written JSON file (or none at all) still yields a complete
//! value. Nothing is defaulted lazily on first use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::errors::Result;

/// Default start and stop timeout for a supervised process.
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(20);

/// Global configuration for a test control plane.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Settings for the etcd member.
    #[serde(default)]
    pub etcd: ProcessConfig,

    /// Settings for the API server member.
    #[serde(default)]
    pub api_server: ProcessConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Parse a configuration from a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Per-process launch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Explicit binary path. Resolved by name when absent.
    pub path: Option<PathBuf>,

    /// How long to wait for the readiness marker.
    #[serde(with = "humantime_serde")]
    pub start_timeout: Duration,

    /// How long to wait for the process to exit after termination.
    #[serde(with = "humantime_serde")]
    pub stop_timeout: Duration,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            path: None,
            start_timeout: DEFAULT_PROCESS_TIMEOUT,
            stop_timeout: DEFAULT_PROCESS_TIMEOUT,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
