//! Plugin resources and the directives they carry.
//!
//! A directive is opaque to the compiler beyond its kind tag: parameters are
//! carried through verbatim (secret references aside) and serialized by the
//! renderer.

use super::Labelled;
use crate::types::{Labels, ObjectKind, ObjectRef, Scope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered parameter bag.
pub type Params = BTreeMap<String, ParamValue>;

/// Role a plugin resource plays in a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Filter,
    Output,
}

impl PluginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Filter => "filter",
            PluginKind::Output => "output",
        }
    }
}

/// Reference to one key of a secret in the agent's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyRef {
    pub name: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecretSource {
    pub secret_key_ref: SecretKeyRef,
}

/// `{ valueFrom: { secretKeyRef: { name, key } } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecretValue {
    pub value_from: SecretSource,
}

/// One parameter value. Variant order matters for untagged decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Secret(SecretValue),
    Section(Params),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn text(value: impl Into<String>) -> Self {
        ParamValue::Text(value.into())
    }

    pub fn secret(name: impl Into<String>, key: impl Into<String>) -> Self {
        ParamValue::Secret(SecretValue {
            value_from: SecretSource {
                secret_key_ref: SecretKeyRef {
                    name: name.into(),
                    key: key.into(),
                },
            },
        })
    }
}

/// A single typed configuration instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDirective {
    /// Kind tag in camelCase, e.g. `recordTransformer`
    pub kind: String,
    /// Explicit `@id`; assigned deterministically when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tag pattern for filter/match sections, `**` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub params: Params,
}

impl PluginDirective {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            tag: None,
            params: Params::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// fluentd `@type` for this directive: the kind tag in snake_case.
    pub fn plugin_type(&self) -> String {
        let mut out = String::with_capacity(self.kind.len() + 4);
        for (i, ch) in self.kind.chars().enumerate() {
            if ch.is_ascii_uppercase() {
                if i > 0 {
                    out.push('_');
                }
                out.push(ch.to_ascii_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// Whether any parameter, at any depth, still references a secret.
    pub fn has_secret_refs(&self) -> bool {
        fn walk(value: &ParamValue) -> bool {
            match value {
                ParamValue::Secret(_) => true,
                ParamValue::Section(params) => params.values().any(walk),
                ParamValue::List(items) => items.iter().any(walk),
                _ => false,
            }
        }
        self.params.values().any(walk)
    }
}

/// A labelled, ordered sequence of filter or output directives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginResource {
    /// Set from the manifest kind
    #[serde(default = "default_scope", skip_serializing)]
    pub scope: Scope,
    #[serde(default = "default_kind", skip_serializing)]
    pub kind: PluginKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub directives: Vec<PluginDirective>,
}

fn default_scope() -> Scope {
    Scope::Namespaced
}

fn default_kind() -> PluginKind {
    PluginKind::Filter
}

impl PluginResource {
    pub fn new(scope: Scope, kind: PluginKind, namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            scope,
            kind,
            name: name.into(),
            namespace: namespace.map(str::to_string),
            labels: Labels::new(),
            directives: Vec::new(),
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_directive(mut self, directive: PluginDirective) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn object_kind(&self) -> ObjectKind {
        match (self.scope, self.kind) {
            (Scope::Cluster, PluginKind::Filter) => ObjectKind::ClusterFilter,
            (Scope::Cluster, PluginKind::Output) => ObjectKind::ClusterOutput,
            (Scope::Namespaced, PluginKind::Filter) => ObjectKind::Filter,
            (Scope::Namespaced, PluginKind::Output) => ObjectKind::Output,
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: self.object_kind(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }
}

impl Labelled for PluginResource {
    fn labels(&self) -> &Labels {
        &self.labels
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}
