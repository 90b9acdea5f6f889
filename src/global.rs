//! Global Plugin Store
//!
//! Per-agent accumulator: the agent's global inputs plus, per routing label,
//! the aggregated filters and outputs of one fragment. Labels are kept in a
//! `BTreeMap` so every consumer sees them in lexical order.

use crate::model::{ConfigFragment, PluginDirective};
use crate::types::{Labels, RoutingLabel};
use serde::Serialize;
use std::collections::BTreeMap;

/// Which records a route accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub namespaces: Vec<String>,
    pub labels: Labels,
    pub hosts: Vec<String>,
    pub container_names: Vec<String>,
}

impl RouteMatch {
    pub fn for_fragment(fragment: &ConfigFragment, namespaces: Vec<String>) -> Self {
        Self {
            namespaces,
            labels: fragment.watched_labels.clone(),
            hosts: fragment.watched_hosts.clone(),
            container_names: fragment.watched_containers.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
            && self.labels.is_empty()
            && self.hosts.is_empty()
            && self.container_names.is_empty()
    }
}

/// Filters then outputs of one fragment, namespace-scoped entries first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedCfgResources {
    pub route: RouteMatch,
    pub filters: Vec<PluginDirective>,
    pub outputs: Vec<PluginDirective>,
}

impl AggregatedCfgResources {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.outputs.is_empty()
    }

    pub fn directive_count(&self) -> usize {
        self.filters.len() + self.outputs.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalPluginStore {
    name: String,
    inputs: Vec<PluginDirective>,
    routes: BTreeMap<RoutingLabel, AggregatedCfgResources>,
}

impl Default for GlobalPluginStore {
    fn default() -> Self {
        Self::new("main")
    }
}

impl GlobalPluginStore {
    /// `name` becomes the router's `@id` and the prefix of generated input ids.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            routes: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an agent's global inputs, assigning ids to those without one.
    pub fn combine_global_inputs(&mut self, directives: Vec<PluginDirective>) {
        for mut directive in directives {
            if directive.id.is_none() {
                directive.id = Some(format!(
                    "{}::input::{}::{}",
                    self.name,
                    directive.plugin_type(),
                    self.inputs.len()
                ));
            }
            self.inputs.push(directive);
        }
    }

    /// Insert or replace the resources for `label`. Callers register the label
    /// with the pass's route registry first.
    pub fn with_cfg_resources(
        &mut self,
        label: impl Into<RoutingLabel>,
        resources: AggregatedCfgResources,
    ) -> Option<AggregatedCfgResources> {
        self.routes.insert(label.into(), resources)
    }

    pub fn inputs(&self) -> &[PluginDirective] {
        &self.inputs
    }

    /// Routes in lexical label order.
    pub fn routes(&self) -> impl Iterator<Item = (&RoutingLabel, &AggregatedCfgResources)> {
        self.routes.iter()
    }

    pub fn route(&self, label: &str) -> Option<&AggregatedCfgResources> {
        self.routes.get(label)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.routes.is_empty()
    }
}
