//! Agent: the log-forwarding process a configuration artifact is compiled for.

use super::{Labelled, ObjectStatus, PluginDirective};
use crate::selector::LabelSelector;
use crate::types::{Labels, ObjectKind, ObjectRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: Labels,
    /// Input directives rendered ahead of every route
    #[serde(default)]
    pub global_inputs: Vec<PluginDirective>,
    /// Worker processes; None means a single worker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<u32>,
    /// Selects the cluster and namespaced fragments composing this agent's pipeline
    #[serde(default)]
    pub fragment_selector: LabelSelector,
    #[serde(default)]
    pub status: ObjectStatus,
}

impl Agent {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: Labels::new(),
            global_inputs: Vec::new(),
            workers: None,
            fragment_selector: LabelSelector::default(),
            status: ObjectStatus::default(),
        }
    }

    /// Effective worker count, never below one.
    pub fn worker_count(&self) -> u32 {
        self.workers.unwrap_or(1).max(1)
    }

    /// Name of the artifact holding this agent's rendered configuration.
    pub fn artifact_name(&self) -> String {
        format!("{}-config", self.name)
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::namespaced(ObjectKind::Agent, &self.namespace, &self.name)
    }
}

impl Labelled for Agent {
    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }
}
