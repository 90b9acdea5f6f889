//! Configuration fragments: cluster-wide or namespace-scoped selections of
//! filter and output resources that become one route in the pipeline.

use super::{Labelled, ObjectStatus};
use crate::selector::LabelSelector;
use crate::types::{Labels, ObjectKind, ObjectRef, Scope};
use serde::{Deserialize, Serialize};

fn default_scope() -> Scope {
    Scope::Namespaced
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFragment {
    /// Set from the manifest kind; not part of the document body
    #[serde(default = "default_scope", skip_serializing)]
    pub scope: Scope,
    pub name: String,
    /// Owning namespace; None for cluster fragments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub filter_selector: LabelSelector,
    #[serde(default)]
    pub output_selector: LabelSelector,
    /// Cluster fragments only: namespaces routed to this fragment, empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watched_namespaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub watched_labels: Labels,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watched_hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watched_containers: Vec<String>,
    /// Explicit routing label; derived from the config id when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_label: Option<String>,
    #[serde(default)]
    pub status: ObjectStatus,
}

impl ConfigFragment {
    fn empty(scope: Scope, namespace: Option<String>, name: String) -> Self {
        Self {
            scope,
            name,
            namespace,
            labels: Labels::new(),
            filter_selector: LabelSelector::default(),
            output_selector: LabelSelector::default(),
            watched_namespaces: Vec::new(),
            watched_labels: Labels::new(),
            watched_hosts: Vec::new(),
            watched_containers: Vec::new(),
            route_label: None,
            status: ObjectStatus::default(),
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self::empty(Scope::Cluster, None, name.into())
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::empty(Scope::Namespaced, Some(namespace.into()), name.into())
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_filter_selector(mut self, selector: LabelSelector) -> Self {
        self.filter_selector = selector;
        self
    }

    pub fn with_output_selector(mut self, selector: LabelSelector) -> Self {
        self.output_selector = selector;
        self
    }

    /// Identifier the routing label and directive ids are derived from.
    pub fn cfg_id(&self) -> String {
        match (&self.scope, &self.namespace) {
            (Scope::Namespaced, Some(ns)) => format!("namespaced::{}::{}", ns, self.name),
            _ => format!("cluster::{}", self.name),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self.scope {
            Scope::Cluster => ObjectKind::ClusterFragment,
            Scope::Namespaced => ObjectKind::Fragment,
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: self.kind(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }
}

impl Labelled for ConfigFragment {
    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}
