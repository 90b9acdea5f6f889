//! Configuration
//!
//! Layered: built-in defaults, the global file
//! (`$XDG_CONFIG_HOME/fluentconf/config.toml`), an explicit `--config` file,
//! then `FLUENTCONF__SECTION__KEY` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::CompileError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Manifest file or directory feeding the object store
    #[serde(default = "default_manifests")]
    pub manifests: PathBuf,

    /// Root of materialized artifacts
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub watch: WatchSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_manifests() -> PathBuf {
    PathBuf::from("manifests")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            manifests: default_manifests(),
            output_dir: default_output_dir(),
            retry: RetryConfig::default(),
            watch: WatchSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CompilerConfig {
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.retry.max_attempts == 0 {
            return Err(CompileError::Config("retry.max_attempts must be at least 1".to_string()));
        }
        if self.watch.batch_window_ms == 0 {
            return Err(CompileError::Config("watch.batch_window_ms must be positive".to_string()));
        }
        self.logging.validate()
    }
}

/// Retry policy for passes aborted by transient store failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff; attempt `n` waits `n * backoff_ms`
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Quiet period after the last event before a pass runs
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Poll interval of the event loop
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_batch_window_ms() -> u64 {
    50
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            batch_window_ms: default_batch_window_ms(),
        }
    }
}
