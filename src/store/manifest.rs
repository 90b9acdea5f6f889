//! YAML manifests: `kind`-tagged documents describing a store snapshot.
//!
//! A manifest path is either one file or a directory whose `*.yaml`/`*.yml`
//! files are read in name order. Each file may hold several `---` documents.

use crate::error::CompileError;
use crate::model::{Agent, ConfigFragment, PluginKind, PluginResource};
use crate::types::Scope;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum Manifest {
    Namespace {
        name: String,
    },
    Secret {
        namespace: String,
        name: String,
        #[serde(default)]
        data: BTreeMap<String, String>,
    },
    Agent(Agent),
    ClusterFragment(ConfigFragment),
    Fragment(ConfigFragment),
    ClusterFilter(PluginResource),
    Filter(PluginResource),
    ClusterOutput(PluginResource),
    Output(PluginResource),
}

impl Manifest {
    /// Fix up scope fields implied by the kind and check namespace presence.
    pub fn normalize(self) -> Result<Self, CompileError> {
        Ok(match self {
            Manifest::ClusterFragment(mut f) => {
                f.scope = Scope::Cluster;
                f.namespace = None;
                Manifest::ClusterFragment(f)
            }
            Manifest::Fragment(mut f) => {
                f.scope = Scope::Namespaced;
                if f.namespace.as_deref().map_or(true, str::is_empty) {
                    return Err(CompileError::Manifest(format!(
                        "Fragment {:?} must set a namespace",
                        f.name
                    )));
                }
                Manifest::Fragment(f)
            }
            Manifest::ClusterFilter(r) => Manifest::ClusterFilter(scoped(r, Scope::Cluster, PluginKind::Filter)?),
            Manifest::Filter(r) => Manifest::Filter(scoped(r, Scope::Namespaced, PluginKind::Filter)?),
            Manifest::ClusterOutput(r) => Manifest::ClusterOutput(scoped(r, Scope::Cluster, PluginKind::Output)?),
            Manifest::Output(r) => Manifest::Output(scoped(r, Scope::Namespaced, PluginKind::Output)?),
            other => other,
        })
    }
}

fn scoped(mut resource: PluginResource, scope: Scope, kind: PluginKind) -> Result<PluginResource, CompileError> {
    resource.scope = scope;
    resource.kind = kind;
    match scope {
        Scope::Cluster => resource.namespace = None,
        Scope::Namespaced => {
            if resource.namespace.as_deref().map_or(true, str::is_empty) {
                return Err(CompileError::Manifest(format!(
                    "{} {:?} must set a namespace",
                    resource.object_kind(),
                    resource.name
                )));
            }
        }
    }
    Ok(resource)
}

/// Parse every document in `text`. `origin` names the source in errors.
pub fn parse_documents(text: &str, origin: &str) -> Result<Vec<Manifest>, CompileError> {
    let mut manifests = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = serde_yaml::Value::deserialize(document)
            .map_err(|e| CompileError::Manifest(format!("{} (document {}): {}", origin, index, e)))?;
        if value.is_null() {
            continue;
        }
        let manifest: Manifest = serde_yaml::from_value(value)
            .map_err(|e| CompileError::Manifest(format!("{} (document {}): {}", origin, index, e)))?;
        manifests.push(manifest.normalize()?);
    }
    Ok(manifests)
}

/// Manifest files under `path`, in load order.
pub fn manifest_files(path: &Path) -> Result<Vec<PathBuf>, CompileError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(CompileError::Manifest(format!(
            "manifest path {} does not exist",
            path.display()
        )));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();
        let is_yaml = entry_path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e == "yaml" || e == "yml");
        if entry_path.is_file() && is_yaml {
            files.push(entry_path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load all manifests under `path`.
pub fn load_path(path: &Path) -> Result<Vec<Manifest>, CompileError> {
    let mut manifests = Vec::new();
    for file in manifest_files(path)? {
        let text = std::fs::read_to_string(&file)?;
        manifests.extend(parse_documents(&text, &file.display().to_string())?);
    }
    Ok(manifests)
}
