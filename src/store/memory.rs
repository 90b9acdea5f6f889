//! In-memory object store over a manifest snapshot.
//!
//! Implements every collaborator interface the compiler needs (listing,
//! secrets, status patches) so a pass can run without a cluster.

use super::manifest::{self, Manifest};
use super::{ObjectStore, SecretLoader};
use crate::error::{CompileError, StoreError};
use crate::model::{Agent, ConfigFragment, PluginKind, PluginResource};
use crate::selector::Selector;
use crate::status::StatusReporter;
use crate::types::{ObjectRef, Scope};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time content of the store.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub namespaces: BTreeSet<String>,
    pub agents: BTreeMap<ObjectRef, Agent>,
    pub fragments: BTreeMap<ObjectRef, ConfigFragment>,
    pub plugins: BTreeMap<ObjectRef, PluginResource>,
    /// (namespace, name) -> key -> value
    pub secrets: BTreeMap<(String, String), BTreeMap<String, String>>,
}

impl Snapshot {
    /// Read every manifest under `path` into a fresh snapshot.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let mut snapshot = Snapshot::default();
        for m in manifest::load_path(path)? {
            snapshot.apply(m);
        }
        Ok(snapshot)
    }

    pub fn apply(&mut self, manifest: Manifest) {
        match manifest {
            Manifest::Namespace { name } => {
                self.namespaces.insert(name);
            }
            Manifest::Secret { namespace, name, data } => {
                self.namespaces.insert(namespace.clone());
                self.secrets.insert((namespace, name), data);
            }
            Manifest::Agent(agent) => {
                self.namespaces.insert(agent.namespace.clone());
                self.agents.insert(agent.object_ref(), agent);
            }
            Manifest::ClusterFragment(fragment) | Manifest::Fragment(fragment) => {
                if let Some(ns) = &fragment.namespace {
                    self.namespaces.insert(ns.clone());
                }
                self.fragments.insert(fragment.object_ref(), fragment);
            }
            Manifest::ClusterFilter(resource)
            | Manifest::Filter(resource)
            | Manifest::ClusterOutput(resource)
            | Manifest::Output(resource) => {
                if let Some(ns) = &resource.namespace {
                    self.namespaces.insert(ns.clone());
                }
                self.plugins.insert(resource.object_ref(), resource);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RwLock<Snapshot>,
    statuses: RwLock<BTreeMap<ObjectRef, String>>,
    failure: RwLock<Option<StoreError>>,
    namespace_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            ..Default::default()
        }
    }

    /// Load a store from a manifest file or directory.
    pub fn from_manifests(path: &Path) -> Result<Self, CompileError> {
        let snapshot = Snapshot::load(path)?;
        tracing::debug!(
            path = %path.display(),
            agents = snapshot.agents.len(),
            fragments = snapshot.fragments.len(),
            plugins = snapshot.plugins.len(),
            "Loaded manifests"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Swap in a fresh snapshot; reported statuses are discarded with the old one.
    pub fn replace_snapshot(&self, snapshot: Snapshot) {
        *self.snapshot.write() = snapshot;
        self.statuses.write().clear();
    }

    pub fn add_namespace(&self, name: &str) {
        self.snapshot.write().namespaces.insert(name.to_string());
    }

    pub fn add_agent(&self, agent: Agent) {
        self.snapshot.write().apply(Manifest::Agent(agent));
    }

    pub fn add_fragment(&self, fragment: ConfigFragment) {
        self.snapshot.write().apply(Manifest::Fragment(fragment));
    }

    pub fn add_plugin(&self, resource: PluginResource) {
        self.snapshot.write().apply(Manifest::Filter(resource));
    }

    pub fn add_secret(&self, namespace: &str, name: &str, key: &str, value: &str) {
        let mut snapshot = self.snapshot.write();
        snapshot.namespaces.insert(namespace.to_string());
        snapshot
            .secrets
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// Make every listing fail with `failure` until reset with `None`.
    pub fn fail_listings(&self, failure: Option<StoreError>) {
        *self.failure.write() = failure;
    }

    /// How many times the namespace listing was requested.
    pub fn namespace_list_calls(&self) -> usize {
        self.namespace_calls.load(Ordering::SeqCst)
    }

    /// Last error message patched onto `object`.
    pub fn status_of(&self, object: &ObjectRef) -> Option<String> {
        self.statuses.read().get(object).cloned()
    }

    pub fn statuses(&self) -> BTreeMap<ObjectRef, String> {
        self.statuses.read().clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        match &*self.failure.read() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl ObjectStore for MemoryStore {
    fn list_agents(&self) -> Result<Vec<Agent>, StoreError> {
        self.check_available()?;
        Ok(self.snapshot.read().agents.values().cloned().collect())
    }

    fn list_fragments(&self, scope: Scope, selector: &Selector) -> Result<Vec<ConfigFragment>, StoreError> {
        self.check_available()?;
        Ok(self
            .snapshot
            .read()
            .fragments
            .values()
            .filter(|f| f.scope == scope && selector.matches(&f.labels))
            .cloned()
            .collect())
    }

    fn list_plugins(
        &self,
        kind: PluginKind,
        scope: Scope,
        selector: &Selector,
        namespace: Option<&str>,
    ) -> Result<Vec<PluginResource>, StoreError> {
        self.check_available()?;
        Ok(self
            .snapshot
            .read()
            .plugins
            .values()
            .filter(|r| r.kind == kind && r.scope == scope)
            .filter(|r| namespace.map_or(true, |ns| r.namespace.as_deref() == Some(ns)))
            .filter(|r| selector.matches(&r.labels))
            .cloned()
            .collect())
    }

    fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        self.namespace_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.read().namespaces.iter().cloned().collect())
    }
}

impl SecretLoader for MemoryStore {
    fn load(&self, namespace: &str, name: &str, key: &str) -> Result<String, StoreError> {
        self.check_available()?;
        self.snapshot
            .read()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .and_then(|data| data.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("secret {}/{} has no key {:?}", namespace, name, key)))
    }
}

impl StatusReporter for MemoryStore {
    fn patch_error(&self, object: &ObjectRef, message: &str) -> Result<(), StoreError> {
        self.statuses.write().insert(object.clone(), message.to_string());
        Ok(())
    }

    fn clear_error(&self, object: &ObjectRef) -> Result<(), StoreError> {
        self.statuses.write().remove(object);
        Ok(())
    }
}
