//! CLI Tooling
//!
//! Command-line surface over the compiler: one-shot compile, render a single
//! agent to stdout, dry-run check, and watch mode.

use crate::config::{CompilerConfig, ConfigLoader};
use crate::driver::{AgentReport, Compiler, PassReport};
use crate::logging::LoggingConfig;
use crate::materialize::{DirectoryMaterializer, MemoryMaterializer};
use crate::render::ARTIFACT_KEYS;
use crate::store::{MemoryStore, ObjectStore};
use crate::tooling::format::format_pass_report_text;
use crate::types::{ObjectKind, ObjectRef};
use crate::watch::{WatchConfig, WatchDaemon};
use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// fluentconf - compile label-selected config fragments into fluentd configuration
#[derive(Parser, Debug)]
#[command(name = "fluentconf", version)]
#[command(about = "Compile label-selected config fragments into fluentd pipeline configuration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (layered over defaults and the global file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Manifest file or directory (overrides `manifests` from config)
    #[arg(long, global = true)]
    pub manifests: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile every agent and write its artifact
    Compile {
        /// Output root (overrides `output_dir` from config)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Render one agent's configuration to stdout
    Render {
        /// Agent as NAMESPACE/NAME
        #[arg(long)]
        agent: String,
        /// Print only this artifact key (fluent.conf, system.conf, app.conf, log.conf)
        #[arg(long)]
        key: Option<String>,
    },
    /// Compile without writing; exit non-zero on any error
    Check {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Recompile whenever the manifests change
    Watch {
        /// Quiet period in milliseconds before a pass runs
        #[arg(long)]
        debounce_ms: Option<u64>,
        /// Event loop poll interval in milliseconds
        #[arg(long)]
        batch_window_ms: Option<u64>,
    },
}

/// Command output plus the process exit code it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self { text, exit_code: 0 }
    }
}

pub struct CliContext {
    config: CompilerConfig,
}

impl CliContext {
    /// Load layered configuration and apply command-line overrides.
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?;
        if let Some(manifests) = &cli.manifests {
            config.manifests = manifests.clone();
        }
        if let Some(level) = &cli.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &cli.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &cli.log_file {
            config.logging.file = Some(file.clone());
        }
        config.validate().context("validating configuration")?;
        Ok(Self { config })
    }

    pub fn from_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn logging_config(&self) -> &LoggingConfig {
        &self.config.logging
    }

    pub fn execute(&self, command: &Commands) -> anyhow::Result<CommandOutput> {
        match command {
            Commands::Compile { out, format } => self.handle_compile(out.clone(), format),
            Commands::Render { agent, key } => self.handle_render(agent, key.as_deref()),
            Commands::Check { format } => self.handle_check(format),
            Commands::Watch {
                debounce_ms,
                batch_window_ms,
            } => self.handle_watch(*debounce_ms, *batch_window_ms),
        }
    }

    fn load_store(&self) -> anyhow::Result<MemoryStore> {
        MemoryStore::from_manifests(&self.config.manifests)
            .with_context(|| format!("loading manifests from {}", self.config.manifests.display()))
    }

    fn handle_compile(&self, out: Option<PathBuf>, format: &str) -> anyhow::Result<CommandOutput> {
        check_format(format)?;
        let store = self.load_store()?;
        let output_dir = out.unwrap_or_else(|| self.config.output_dir.clone());
        let materializer = DirectoryMaterializer::new(&output_dir);
        let report = Compiler::with_backend(&store, &materializer)
            .run_with_retry(&self.config.retry)
            .context("compilation pass failed")?;
        info!(output_dir = %output_dir.display(), written = report.written(), "Compile finished");

        let exit_code = if report.failures.is_empty() { 0 } else { 1 };
        Ok(CommandOutput {
            text: format_report(&report, format)?,
            exit_code,
        })
    }

    fn handle_check(&self, format: &str) -> anyhow::Result<CommandOutput> {
        check_format(format)?;
        let store = self.load_store()?;
        let materializer = MemoryMaterializer::new();
        let report = Compiler::with_backend(&store, &materializer)
            .run_with_retry(&self.config.retry)
            .context("compilation pass failed")?;
        let exit_code = if report.error_count() == 0 { 0 } else { 1 };
        Ok(CommandOutput {
            text: format_report(&report, format)?,
            exit_code,
        })
    }

    fn handle_render(&self, agent: &str, key: Option<&str>) -> anyhow::Result<CommandOutput> {
        if let Some(key) = key {
            if !ARTIFACT_KEYS.contains(&key) {
                bail!("unknown artifact key {:?} (expected one of {})", key, ARTIFACT_KEYS.join(", "));
            }
        }
        let target = parse_agent_ref(agent)?;
        let store = self.load_store()?;
        let mut found = store
            .list_agents()
            .map_err(|e| anyhow!(e))?
            .into_iter()
            .find(|a| a.object_ref() == target)
            .ok_or_else(|| anyhow!("agent {} not found in {}", agent, self.config.manifests.display()))?;

        let materializer = MemoryMaterializer::new();
        let report = Compiler::with_backend(&store, &materializer).compile_agent(&mut found)?;
        render_output(&report, key)
    }

    fn handle_watch(&self, debounce_ms: Option<u64>, batch_window_ms: Option<u64>) -> anyhow::Result<CommandOutput> {
        let mut settings = self.config.watch.clone();
        if let Some(ms) = debounce_ms {
            settings.debounce_ms = ms;
        }
        if let Some(ms) = batch_window_ms {
            settings.batch_window_ms = ms;
        }
        let daemon = WatchDaemon::new(
            WatchConfig::new(&self.config.manifests, &settings),
            self.config.retry.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(DirectoryMaterializer::new(&self.config.output_dir)),
        );
        daemon.start().context("watch daemon failed")?;
        Ok(CommandOutput::ok(format!(
            "Watch stopped after {} passes.",
            daemon.pass_count()
        )))
    }
}

fn check_format(format: &str) -> anyhow::Result<()> {
    match format {
        "text" | "json" => Ok(()),
        other => bail!("invalid format {:?} (must be 'text' or 'json')", other),
    }
}

fn format_report(report: &PassReport, format: &str) -> anyhow::Result<String> {
    if format == "json" {
        Ok(serde_json::to_string_pretty(report)?)
    } else {
        Ok(format_pass_report_text(report))
    }
}

fn render_output(report: &AgentReport, key: Option<&str>) -> anyhow::Result<CommandOutput> {
    let rendered = match (&report.rendered, report.skipped) {
        (Some(rendered), false) => rendered,
        _ => bail!(
            "{} was not rendered: {}",
            report.agent,
            report.error.as_deref().unwrap_or("no artifact produced")
        ),
    };
    let text = match key {
        Some(key) => rendered.get(key).unwrap_or_default().to_string(),
        None => {
            let mut text = String::new();
            for (key, content) in rendered.entries() {
                text.push_str(&format!("# ==> {} <==\n{}\n", key, content));
            }
            text
        }
    };
    Ok(CommandOutput {
        text,
        exit_code: if report.error_count() == 0 { 0 } else { 1 },
    })
}

/// `NAMESPACE/NAME` into an agent reference.
pub fn parse_agent_ref(value: &str) -> anyhow::Result<ObjectRef> {
    match value.split_once('/') {
        Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(ObjectRef::namespaced(ObjectKind::Agent, ns, name))
        }
        _ => bail!("agent must be given as NAMESPACE/NAME, got {:?}", value),
    }
}
