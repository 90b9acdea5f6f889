//! Manifest change events and batching.

use crate::config::WatchSettings;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Manifest file or directory
    pub manifests: PathBuf,
    /// Quiet period after the last event before a batch is released
    pub debounce_ms: u64,
    /// Event loop poll interval
    pub batch_window_ms: u64,
    /// Pending paths that force a release regardless of debounce
    pub max_batch_size: usize,
}

impl WatchConfig {
    pub fn new(manifests: impl Into<PathBuf>, settings: &WatchSettings) -> Self {
        Self {
            manifests: manifests.into(),
            debounce_ms: settings.debounce_ms,
            batch_window_ms: settings.batch_window_ms,
            max_batch_size: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl ChangeEvent {
    pub fn path(&self) -> &Path {
        match self {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) | ChangeEvent::Removed(p) => p,
            ChangeEvent::Renamed { to, .. } => to,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Created(_) => "created",
            ChangeEvent::Modified(_) => "modified",
            ChangeEvent::Removed(_) => "removed",
            ChangeEvent::Renamed { .. } => "renamed",
        }
    }
}

/// Coalesces events until the manifests have been quiet for the debounce
/// window. One released batch triggers one pass.
pub(crate) struct EventBatcher {
    config: WatchConfig,
    pending: BTreeMap<PathBuf, ChangeEvent>,
    last_event: Option<Instant>,
}

impl EventBatcher {
    pub(crate) fn new(config: WatchConfig) -> Self {
        Self {
            config,
            pending: BTreeMap::new(),
            last_event: None,
        }
    }

    /// Queue `event`. Returns true when the batch is full and should be
    /// released immediately.
    pub(crate) fn add_event(&mut self, event: ChangeEvent, now: Instant) -> bool {
        if !self.is_relevant(&event) {
            return false;
        }
        self.pending.insert(event.path().to_path_buf(), event);
        self.last_event = Some(now);
        self.pending.len() >= self.config.max_batch_size
    }

    /// Whether pending events have been quiet for the debounce window.
    pub(crate) fn is_settled(&self, now: Instant) -> bool {
        let debounce = Duration::from_millis(self.config.debounce_ms);
        match self.last_event {
            Some(last) => !self.pending.is_empty() && now.saturating_duration_since(last) >= debounce,
            None => false,
        }
    }

    pub(crate) fn take_batch(&mut self) -> Vec<ChangeEvent> {
        self.last_event = None;
        std::mem::take(&mut self.pending).into_values().collect()
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    fn is_relevant(&self, event: &ChangeEvent) -> bool {
        let paths: Vec<&Path> = match event {
            ChangeEvent::Renamed { from, to } => vec![from, to],
            other => vec![other.path()],
        };
        paths.into_iter().any(|p| self.is_manifest(p))
    }

    fn is_manifest(&self, path: &Path) -> bool {
        if self.config.manifests.extension().is_some() && !self.config.manifests.is_dir() {
            return path == self.config.manifests || path.file_name() == self.config.manifests.file_name();
        }
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(true, |n| n.starts_with('.'));
        let yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e == "yaml" || e == "yml");
        yaml && !hidden
    }
}
