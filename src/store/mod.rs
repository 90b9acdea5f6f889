//! Object Store
//!
//! Read interface onto the declarative-object store that holds agents,
//! fragments and plugin resources. The compiler only lists; it never writes
//! objects back (status goes through [`crate::status::StatusReporter`]).

pub mod manifest;
pub mod memory;

use crate::error::StoreError;
use crate::model::{Agent, ConfigFragment, PluginKind, PluginResource};
use crate::selector::Selector;
use crate::types::Scope;

pub use memory::MemoryStore;

/// Listing interface the compilation driver depends on.
///
/// Implementations must return objects in a stable order and surface timeouts
/// as [`StoreError::Transient`].
pub trait ObjectStore {
    fn list_agents(&self) -> Result<Vec<Agent>, StoreError>;

    fn list_fragments(&self, scope: Scope, selector: &Selector) -> Result<Vec<ConfigFragment>, StoreError>;

    /// Plugin resources of one kind and scope matching `selector`; when
    /// `namespace` is set only objects in that namespace are returned.
    fn list_plugins(
        &self,
        kind: PluginKind,
        scope: Scope,
        selector: &Selector,
        namespace: Option<&str>,
    ) -> Result<Vec<PluginResource>, StoreError>;

    fn list_namespaces(&self) -> Result<Vec<String>, StoreError>;
}

/// Resolves secret references found in directive parameters.
pub trait SecretLoader {
    fn load(&self, namespace: &str, name: &str, key: &str) -> Result<String, StoreError>;
}
