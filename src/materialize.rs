//! Artifact materialization.
//!
//! A rendered config is persisted per owning agent. Writes are skipped when
//! the content digest matches what the owner last received.

use crate::error::CompileError;
use crate::render::RenderedConfig;
use crate::types::ObjectRef;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub trait Materializer {
    /// Persist `config` for `owner`. Returns whether anything was written.
    fn materialize(&self, owner: &ObjectRef, artifact: &str, config: &RenderedConfig) -> Result<bool, CompileError>;
}

/// Writes `<root>/<namespace>/<artifact>/<key>` files.
#[derive(Debug)]
pub struct DirectoryMaterializer {
    root: PathBuf,
    digests: Mutex<BTreeMap<ObjectRef, String>>,
}

impl DirectoryMaterializer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            digests: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_dir(&self, owner: &ObjectRef, artifact: &str) -> PathBuf {
        let mut dir = self.root.clone();
        if let Some(ns) = &owner.namespace {
            dir.push(ns);
        }
        dir.push(artifact);
        dir
    }

    fn on_disk_matches(dir: &Path, config: &RenderedConfig) -> bool {
        config.entries().iter().all(|(key, content)| {
            std::fs::read_to_string(dir.join(key))
                .map(|existing| existing == *content)
                .unwrap_or(false)
        })
    }
}

impl Materializer for DirectoryMaterializer {
    fn materialize(&self, owner: &ObjectRef, artifact: &str, config: &RenderedConfig) -> Result<bool, CompileError> {
        let digest = config.digest();
        let dir = self.artifact_dir(owner, artifact);

        let mut digests = self.digests.lock();
        let unchanged = match digests.get(owner) {
            Some(previous) => *previous == digest && dir.is_dir(),
            None => Self::on_disk_matches(&dir, config),
        };
        if unchanged {
            digests.insert(owner.clone(), digest);
            tracing::debug!(owner = %owner, "Artifact unchanged, skipping write");
            return Ok(false);
        }

        std::fs::create_dir_all(&dir)
            .map_err(|e| CompileError::Materialize(format!("create {}: {}", dir.display(), e)))?;
        for (key, content) in config.entries() {
            let path = dir.join(key);
            std::fs::write(&path, content)
                .map_err(|e| CompileError::Materialize(format!("write {}: {}", path.display(), e)))?;
        }
        digests.insert(owner.clone(), digest);
        tracing::info!(owner = %owner, dir = %dir.display(), "Main configuration updated");
        Ok(true)
    }
}

/// Keeps artifacts in memory; used by `check` and tests.
#[derive(Debug, Default)]
pub struct MemoryMaterializer {
    artifacts: Mutex<BTreeMap<ObjectRef, (String, RenderedConfig)>>,
}

impl MemoryMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &ObjectRef) -> Option<RenderedConfig> {
        self.artifacts.lock().get(owner).map(|(_, c)| c.clone())
    }

    pub fn artifact_name(&self, owner: &ObjectRef) -> Option<String> {
        self.artifacts.lock().get(owner).map(|(name, _)| name.clone())
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.lock().is_empty()
    }
}

impl Materializer for MemoryMaterializer {
    fn materialize(&self, owner: &ObjectRef, artifact: &str, config: &RenderedConfig) -> Result<bool, CompileError> {
        let mut artifacts = self.artifacts.lock();
        if artifacts.get(owner).map_or(false, |(_, c)| c == config) {
            return Ok(false);
        }
        artifacts.insert(owner.clone(), (artifact.to_string(), config.clone()));
        Ok(true)
    }
}
