//! Compilation Driver
//!
//! One pass per agent: compile the agent's fragment selector, resolve cluster
//! then namespaced fragments, aggregate each into the agent's
//! [`GlobalPluginStore`], render, and hand the artifact to the materializer.
//!
//! Fragment-scoped errors are written to the fragment's status and reported;
//! the render proceeds with the valid subset. Transient listing failures abort
//! the agent's pass and are retried by [`Compiler::run_with_retry`].

use crate::aggregate::{resolve_secrets, FragmentSelectors, PluginAggregator};
use crate::config::RetryConfig;
use crate::error::{CompileError, StoreError};
use crate::global::{GlobalPluginStore, RouteMatch};
use crate::materialize::Materializer;
use crate::model::{Agent, ConfigFragment};
use crate::render::{render, RenderedConfig};
use crate::routing::{routing_label, RouteRegistry};
use crate::scope::ScopeResolver;
use crate::selector::{LabelSelector, Selector};
use crate::status::{record_errors, StatusReporter};
use crate::store::{ObjectStore, SecretLoader};
use crate::types::{ObjectRef, RoutingLabel, Scope};
use serde::Serialize;
use std::time::Instant;

/// State scoped to one pass. Nothing here outlives it.
#[derive(Debug, Default)]
pub struct PassContext {
    registry: RouteRegistry,
    scopes: ScopeResolver,
}

impl PassContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels are unique per agent; the namespace snapshot is shared.
    fn begin_agent(&mut self) {
        self.registry = RouteRegistry::new();
    }
}

/// Outcome for one fragment.
#[derive(Debug, Clone, Serialize)]
pub struct FragmentReport {
    pub fragment: ObjectRef,
    /// Set when the fragment contributed a route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<RoutingLabel>,
    pub filters: usize,
    pub outputs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub agent: ObjectRef,
    pub artifact: String,
    pub workers: u32,
    pub inputs: usize,
    pub fragments: Vec<FragmentReport>,
    /// Agent-level error (malformed selector, unresolvable global input)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// No artifact was produced
    pub skipped: bool,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip)]
    pub rendered: Option<RenderedConfig>,
}

impl AgentReport {
    fn new(agent: &Agent) -> Self {
        Self {
            agent: agent.object_ref(),
            artifact: agent.artifact_name(),
            workers: agent.worker_count(),
            inputs: 0,
            fragments: Vec::new(),
            error: None,
            skipped: false,
            written: false,
            digest: None,
            rendered: None,
        }
    }

    pub fn routes(&self) -> usize {
        self.fragments.iter().filter(|f| f.label.is_some()).count()
    }

    /// Agent-level plus fragment-level errors.
    pub fn error_count(&self) -> usize {
        usize::from(self.error.is_some()) + self.fragments.iter().filter(|f| f.error.is_some()).count()
    }
}

/// An agent whose pass aborted.
#[derive(Debug, Clone, Serialize)]
pub struct AgentFailure {
    pub agent: ObjectRef,
    pub error: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    pub agents: Vec<AgentReport>,
    pub failures: Vec<AgentFailure>,
    pub attempts: u32,
    pub duration_ms: u64,
}

impl PassReport {
    pub fn has_retryable_failures(&self) -> bool {
        self.failures.iter().any(|f| f.retryable)
    }

    pub fn error_count(&self) -> usize {
        self.failures.len() + self.agents.iter().map(AgentReport::error_count).sum::<usize>()
    }

    pub fn written(&self) -> usize {
        self.agents.iter().filter(|a| a.written).count()
    }

    pub fn agent(&self, agent: &ObjectRef) -> Option<&AgentReport> {
        self.agents.iter().find(|a| &a.agent == agent)
    }
}

pub struct Compiler<'a> {
    store: &'a dyn ObjectStore,
    secrets: &'a dyn SecretLoader,
    reporter: &'a dyn StatusReporter,
    materializer: &'a dyn Materializer,
}

impl<'a> Compiler<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        secrets: &'a dyn SecretLoader,
        reporter: &'a dyn StatusReporter,
        materializer: &'a dyn Materializer,
    ) -> Self {
        Self {
            store,
            secrets,
            reporter,
            materializer,
        }
    }

    /// Build a compiler over one backend serving every collaborator role.
    pub fn with_backend<B>(backend: &'a B, materializer: &'a dyn Materializer) -> Self
    where
        B: ObjectStore + SecretLoader + StatusReporter,
    {
        Self::new(backend, backend, backend, materializer)
    }

    /// Compile a single agent in a fresh pass.
    pub fn compile_agent(&self, agent: &mut Agent) -> Result<AgentReport, CompileError> {
        self.compile_agent_in(&mut PassContext::new(), agent)
    }

    /// Compile every agent once. Only a failed agent listing fails the pass;
    /// per-agent aborts are collected in [`PassReport::failures`].
    pub fn run_pass(&self) -> Result<PassReport, CompileError> {
        let started = Instant::now();
        let mut agents = match self.store.list_agents() {
            Ok(agents) => agents,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        agents.sort_by_key(|a| a.object_ref());

        let mut ctx = PassContext::new();
        let mut report = PassReport {
            attempts: 1,
            ..Default::default()
        };
        for agent in agents.iter_mut() {
            match self.compile_agent_in(&mut ctx, agent) {
                Ok(agent_report) => report.agents.push(agent_report),
                Err(e) => {
                    tracing::warn!(agent = %agent.object_ref(), error = %e, "Agent pass aborted");
                    report.failures.push(AgentFailure {
                        agent: agent.object_ref(),
                        error: e.to_string(),
                        retryable: e.is_retryable(),
                    });
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            agents = report.agents.len(),
            failures = report.failures.len(),
            written = report.written(),
            duration_ms = report.duration_ms,
            "Compilation pass complete"
        );
        Ok(report)
    }

    /// Run passes until none is aborted by a transient failure or
    /// `policy.max_attempts` is reached. Attempt `n` is preceded by a wait of
    /// `n * backoff_ms`.
    pub fn run_with_retry(&self, policy: &RetryConfig) -> Result<PassReport, CompileError> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = self.run_pass();
            let retry = match &outcome {
                Ok(report) => report.has_retryable_failures(),
                Err(e) => e.is_retryable(),
            };
            if !retry || attempt >= max_attempts {
                return outcome.map(|mut report| {
                    report.attempts = attempt;
                    report
                });
            }
            let wait = policy.backoff(attempt);
            tracing::warn!(attempt, wait_ms = wait.as_millis() as u64, "Transient failure, retrying pass");
            std::thread::sleep(wait);
            attempt += 1;
        }
    }

    fn compile_agent_in(&self, ctx: &mut PassContext, agent: &mut Agent) -> Result<AgentReport, CompileError> {
        ctx.begin_agent();
        let mut report = AgentReport::new(agent);

        let agent_selector = match Selector::compile(&agent.fragment_selector) {
            Ok(selector) => selector,
            Err(e) => {
                let err = CompileError::Selector {
                    owner: agent.object_ref(),
                    reason: e.to_string(),
                };
                tracing::warn!(agent = %report.agent, error = %err, "Skipping agent");
                report.error = record_errors(agent, &[err.to_string()], self.reporter);
                report.skipped = true;
                return Ok(report);
            }
        };

        let mut global = GlobalPluginStore::default();
        let mut agent_errors = Vec::new();
        let mut inputs = Vec::with_capacity(agent.global_inputs.len());
        for input in &agent.global_inputs {
            let mut input = input.clone();
            match resolve_secrets(&mut input, self.secrets, &agent.namespace) {
                Ok(()) => inputs.push(input),
                Err(StoreError::NotFound(msg)) => {
                    let err = CompileError::Aggregation {
                        owner: agent.object_ref(),
                        reason: format!("global input {}: {}", input.plugin_type(), msg),
                    };
                    tracing::warn!(error = %err, "Dropping global input");
                    agent_errors.push(err.to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }
        global.combine_global_inputs(inputs);
        report.inputs = global.inputs().len();

        let mut fragments = self.list_fragments(Scope::Cluster, &agent_selector)?;
        fragments.extend(self.list_fragments(Scope::Namespaced, &agent_selector)?);

        let aggregator = PluginAggregator::new(self.store, self.secrets, &agent.namespace);
        for fragment in fragments.iter_mut() {
            let fragment_report = self.compile_fragment(ctx, &aggregator, fragment, &mut global)?;
            report.fragments.push(fragment_report);
        }

        report.error = record_errors(agent, &agent_errors, self.reporter);

        let rendered = render(&global, agent.worker_count())?;
        report.digest = Some(rendered.digest());
        report.written = self
            .materializer
            .materialize(&report.agent, &report.artifact, &rendered)?;
        report.rendered = Some(rendered);

        tracing::info!(
            agent = %report.agent,
            routes = report.routes(),
            errors = report.error_count(),
            written = report.written,
            "Agent compiled"
        );
        Ok(report)
    }

    /// Cluster or namespaced fragments selected by the agent, in identity order.
    fn list_fragments(&self, scope: Scope, selector: &Selector) -> Result<Vec<ConfigFragment>, CompileError> {
        let mut fragments = match self.store.list_fragments(scope, selector) {
            Ok(fragments) => fragments,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        fragments.sort_by_key(|f| f.object_ref());
        Ok(fragments)
    }

    fn compile_fragment(
        &self,
        ctx: &mut PassContext,
        aggregator: &PluginAggregator<'_>,
        fragment: &mut ConfigFragment,
        global: &mut GlobalPluginStore,
    ) -> Result<FragmentReport, CompileError> {
        let owner = fragment.object_ref();
        let mut report = FragmentReport {
            fragment: owner.clone(),
            label: None,
            filters: 0,
            outputs: 0,
            error: None,
        };

        let selectors = match compile_selectors(fragment) {
            Ok(selectors) => selectors,
            Err(err) => {
                tracing::warn!(fragment = %owner, error = %err, "Excluding fragment");
                report.error = record_errors(fragment, &[err.to_string()], self.reporter);
                return Ok(report);
            }
        };

        let label = routing_label(fragment);
        if let Err(err) = ctx.registry.register(&label, &owner) {
            tracing::warn!(fragment = %owner, error = %err, "Excluding fragment");
            report.error = record_errors(fragment, &[err.to_string()], self.reporter);
            return Ok(report);
        }

        let namespaces = ctx.scopes.watched_namespaces(self.store, fragment)?;
        let aggregation = aggregator.aggregate(fragment, &selectors, RouteMatch::for_fragment(fragment, namespaces))?;

        let errors: Vec<String> = aggregation
            .errors
            .into_iter()
            .map(|reason| {
                CompileError::Aggregation {
                    owner: owner.clone(),
                    reason,
                }
                .to_string()
            })
            .collect();
        for error in &errors {
            tracing::warn!(fragment = %owner, error = %error, "Dropped directive");
        }

        report.filters = aggregation.resources.filters.len();
        report.outputs = aggregation.resources.outputs.len();
        tracing::debug!(
            fragment = %owner,
            label = %label,
            filters = report.filters,
            outputs = report.outputs,
            "Fragment aggregated"
        );
        global.with_cfg_resources(label.clone(), aggregation.resources);
        report.label = Some(label);
        report.error = record_errors(fragment, &errors, self.reporter);
        Ok(report)
    }
}

fn compile_selectors(fragment: &ConfigFragment) -> Result<FragmentSelectors, CompileError> {
    let compile = |raw: &LabelSelector| {
        Selector::compile(raw).map_err(|e| CompileError::Selector {
            owner: fragment.object_ref(),
            reason: e.to_string(),
        })
    };
    Ok(FragmentSelectors {
        filter: compile(&fragment.filter_selector)?,
        output: compile(&fragment.output_selector)?,
    })
}
