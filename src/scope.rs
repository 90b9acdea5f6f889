//! Scope Resolver
//!
//! Determines which namespaces route into a fragment. Cluster fragments with
//! no explicit list watch every namespace; the namespace listing is fetched at
//! most once per pass.

use crate::error::{CompileError, StoreError};
use crate::model::ConfigFragment;
use crate::store::ObjectStore;
use crate::types::Scope;

/// Per-pass namespace snapshot.
#[derive(Debug, Default)]
pub struct ScopeResolver {
    all_namespaces: Option<Vec<String>>,
}

impl ScopeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespaces whose logs route to `fragment`.
    pub fn watched_namespaces(
        &mut self,
        store: &dyn ObjectStore,
        fragment: &ConfigFragment,
    ) -> Result<Vec<String>, CompileError> {
        match fragment.scope {
            Scope::Namespaced => Ok(fragment.namespace.iter().cloned().collect()),
            Scope::Cluster if !fragment.watched_namespaces.is_empty() => {
                Ok(fragment.watched_namespaces.clone())
            }
            Scope::Cluster => Ok(self.all_namespaces(store)?.to_vec()),
        }
    }

    fn all_namespaces(&mut self, store: &dyn ObjectStore) -> Result<&[String], CompileError> {
        if self.all_namespaces.is_none() {
            let namespaces = match store.list_namespaces() {
                Ok(namespaces) => namespaces,
                Err(StoreError::NotFound(_)) => Vec::new(),
                Err(e) => return Err(e.into()),
            };
            tracing::debug!(count = namespaces.len(), "Listed namespaces for pass");
            self.all_namespaces = Some(namespaces);
        }
        Ok(self.all_namespaces.as_deref().unwrap_or_default())
    }

    /// Whether the namespace listing has been fetched in this pass.
    pub fn is_cached(&self) -> bool {
        self.all_namespaces.is_some()
    }
}
