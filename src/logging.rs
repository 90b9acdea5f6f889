//! Logging
//!
//! `tracing` subscriber setup. Level, format and destination come from
//! [`LoggingConfig`], each overridable through `FLUENTCONF_LOG*` variables.

use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const ENV_LOG: &str = "FLUENTCONF_LOG";
pub const ENV_LOG_FORMAT: &str = "FLUENTCONF_LOG_FORMAT";
pub const ENV_LOG_OUTPUT: &str = "FLUENTCONF_LOG_OUTPUT";
pub const ENV_LOG_FILE: &str = "FLUENTCONF_LOG_FILE";
pub const ENV_LOG_MODULES: &str = "FLUENTCONF_LOG_MODULES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr, file, file+stderr, both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file when output includes file; `None` uses the state directory
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// ANSI colors for text output on a terminal stream
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `fluentconf::aggregate = "debug"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

// stdout carries rendered configs and reports
fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: true,
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), CompileError> {
        parse_format(&self.format)?;
        parse_output_destinations(&self.output)?;
        Ok(())
    }
}

/// Log file path: CLI flag, then `FLUENTCONF_LOG_FILE`, then config, then
/// `<state dir>/fluentconf.log`.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, CompileError> {
    let env_file = std::env::var(ENV_LOG_FILE).ok().map(PathBuf::from);
    if let Some(path) = [cli_file, env_file, config_file]
        .into_iter()
        .flatten()
        .find(|p| !p.as_os_str().is_empty())
    {
        return Ok(path);
    }
    default_log_file_path()
}

fn default_log_file_path() -> Result<PathBuf, CompileError> {
    let dirs = directories::ProjectDirs::from("", "fluentconf", "fluentconf").ok_or_else(|| {
        CompileError::Config("could not determine a home directory for the log file".to_string())
    })?;
    // macOS and Windows have no state dir; fall back to the data dir there.
    let dir = dirs.state_dir().unwrap_or_else(|| dirs.data_local_dir());
    Ok(dir.join("fluentconf.log"))
}

/// Install the global subscriber. Environment variables win over `config`.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), CompileError> {
    if config.map_or(false, |c| !c.enabled) {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .try_init()
            .map_err(|e| CompileError::Config(format!("failed to install log subscriber: {}", e)))?;
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = match std::env::var(ENV_LOG_FORMAT) {
        Ok(value) => parse_format(&value)?,
        Err(_) => parse_format(config.map_or("text", |c| c.format.as_str()))?,
    };
    let output = match std::env::var(ENV_LOG_OUTPUT) {
        Ok(value) => parse_output_destinations(&value)?,
        Err(_) => parse_output_destinations(config.map_or("stderr", |c| c.output.as_str()))?,
    };
    let writer = build_writer(&output, config)?;
    let ansi = !output.file && config.map_or(true, |c| c.color);

    let registry = Registry::default().with(filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(|e| CompileError::Config(format!("failed to install log subscriber: {}", e)))
}

fn build_writer(output: &OutputDestinations, config: Option<&LoggingConfig>) -> Result<BoxMakeWriter, CompileError> {
    let open_file = || -> Result<std::fs::File, CompileError> {
        let path = resolve_log_file_path(None, config.and_then(|c| c.file.clone()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CompileError::Config(format!("failed to open log file {}: {}", path.display(), e)))
    };

    Ok(match (output.stdout, output.stderr, output.file) {
        (_, true, true) => BoxMakeWriter::new(open_file()?.and(std::io::stderr)),
        (_, _, true) => BoxMakeWriter::new(open_file()?),
        (true, true, false) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        (true, false, false) => BoxMakeWriter::new(std::io::stdout),
        _ => BoxMakeWriter::new(std::io::stderr),
    })
}

fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, CompileError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_LOG) {
        return Ok(filter);
    }

    let level = config.map_or("info", |c| c.level.as_str());
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }
    let mut filter = EnvFilter::new(level);

    let mut directives: Vec<String> = config
        .map(|c| c.modules.iter().map(|(m, l)| format!("{}={}", m, l)).collect())
        .unwrap_or_default();
    if let Ok(modules) = std::env::var(ENV_LOG_MODULES) {
        directives.extend(
            modules
                .split(',')
                .filter_map(|entry| entry.split_once('='))
                .map(|(m, l)| format!("{}={}", m.trim(), l.trim())),
        );
    }
    for directive in directives {
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| CompileError::Config(format!("invalid log directive {:?}: {}", directive, e)))?,
        );
    }
    Ok(filter)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<LogFormat, CompileError> {
    match format {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(CompileError::Config(format!(
            "invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, CompileError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stderr" => (false, true, true),
        "both" => (true, true, false),
        other => {
            return Err(CompileError::Config(format!(
                "invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                other
            )))
        }
    };
    Ok(OutputDestinations { stdout, stderr, file })
}
