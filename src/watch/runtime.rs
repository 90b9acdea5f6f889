//! Watch daemon: reload manifests and recompile on change.

use super::events::{ChangeEvent, EventBatcher, WatchConfig};
use crate::config::RetryConfig;
use crate::driver::{Compiler, PassReport};
use crate::error::CompileError;
use crate::materialize::Materializer;
use crate::store::memory::Snapshot;
use crate::store::MemoryStore;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Stops a running daemon from another thread.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    running: Arc<RwLock<bool>>,
}

impl WatchHandle {
    pub fn stop(&self) {
        *self.running.write() = false;
    }

    pub fn is_running(&self) -> bool {
        *self.running.read()
    }
}

pub struct WatchDaemon {
    config: WatchConfig,
    retry: RetryConfig,
    store: Arc<MemoryStore>,
    materializer: Arc<dyn Materializer + Send + Sync>,
    running: Arc<RwLock<bool>>,
    passes: AtomicUsize,
}

impl WatchDaemon {
    pub fn new(
        config: WatchConfig,
        retry: RetryConfig,
        store: Arc<MemoryStore>,
        materializer: Arc<dyn Materializer + Send + Sync>,
    ) -> Self {
        Self {
            config,
            retry,
            store,
            materializer,
            running: Arc::new(RwLock::new(false)),
            passes: AtomicUsize::new(0),
        }
    }

    pub fn handle(&self) -> WatchHandle {
        WatchHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn pass_count(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }

    /// Run an initial pass, then one pass per settled batch of manifest
    /// changes until stopped. Blocks the calling thread.
    pub fn start(&self) -> Result<(), CompileError> {
        *self.running.write() = true;

        if let Err(e) = self.reload_and_compile() {
            warn!(error = %e, "Initial pass failed; waiting for manifest changes");
        }

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = tx.send(res) {
                error!("Error sending watch event: {}", e);
            }
        })
        .map_err(|e| CompileError::Config(format!("failed to create watcher: {}", e)))?;
        watcher
            .watch(&self.config.manifests, RecursiveMode::NonRecursive)
            .map_err(|e| {
                CompileError::Config(format!("failed to watch {}: {}", self.config.manifests.display(), e))
            })?;
        info!(manifests = %self.config.manifests.display(), "Watching manifests");

        let mut batcher = EventBatcher::new(self.config.clone());
        let poll = Duration::from_millis(self.config.batch_window_ms.max(1));

        while *self.running.read() {
            let mut release = false;
            match rx.recv_timeout(poll) {
                Ok(Ok(event)) => {
                    if let Some(change) = convert_event(event) {
                        release = batcher.add_event(change, Instant::now());
                    }
                }
                Ok(Err(e)) => warn!("Watch error: {}", e),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    error!("Watcher channel disconnected");
                    break;
                }
            }

            if release || batcher.is_settled(Instant::now()) {
                self.process_batch(batcher.take_batch());
            }
        }

        info!("Watch daemon stopped");
        Ok(())
    }

    pub fn stop(&self) {
        *self.running.write() = false;
    }

    fn process_batch(&self, events: Vec<ChangeEvent>) {
        if events.is_empty() {
            return;
        }
        info!(event_count = events.len(), "Manifests changed");
        for event in &events {
            debug!(kind = event.kind(), path = %event.path().display(), "Change event");
        }
        if let Err(e) = self.reload_and_compile() {
            error!(error = %e, "Pass failed");
        }
    }

    /// Reload the manifests into the store and run one pass with retries. A
    /// manifest that fails to parse leaves the previous snapshot in place.
    pub fn reload_and_compile(&self) -> Result<PassReport, CompileError> {
        let snapshot = Snapshot::load(&self.config.manifests)?;
        self.store.replace_snapshot(snapshot);

        let compiler = Compiler::with_backend(self.store.as_ref(), self.materializer.as_ref());
        let report = compiler.run_with_retry(&self.retry)?;
        self.passes.fetch_add(1, Ordering::SeqCst);
        Ok(report)
    }
}

fn convert_event(event: Event) -> Option<ChangeEvent> {
    let first = event.paths.first().cloned();
    match event.kind {
        EventKind::Create(_) => first.map(ChangeEvent::Created),
        EventKind::Modify(notify::event::ModifyKind::Name(_)) if event.paths.len() >= 2 => {
            Some(ChangeEvent::Renamed {
                from: event.paths[0].clone(),
                to: event.paths[1].clone(),
            })
        }
        EventKind::Modify(_) => first.map(ChangeEvent::Modified),
        EventKind::Remove(_) => first.map(ChangeEvent::Removed),
        _ => None,
    }
}
