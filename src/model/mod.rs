//! Data model: agents, configuration fragments, plugin resources and directives.
//!
//! Everything here is read-only input to a pass except the status fields, which
//! the driver writes back through [`crate::status::HasErrorStatus`].

pub mod agent;
pub mod fragment;
pub mod plugin;

use crate::types::Labels;
use serde::{Deserialize, Serialize};

pub use agent::Agent;
pub use fragment::ConfigFragment;
pub use plugin::{
    ParamValue, Params, PluginDirective, PluginKind, PluginResource, SecretKeyRef, SecretSource,
    SecretValue,
};

/// Anything a label selector can be evaluated against.
pub trait Labelled {
    fn labels(&self) -> &Labels;
    fn namespace(&self) -> Option<&str>;
}

/// Mutable status written back to the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStatus {
    /// Comma-joined error messages from the last pass; None when healthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}
