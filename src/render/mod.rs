//! Config Renderer
//!
//! Serializes a [`GlobalPluginStore`] into the four text blocks of an agent's
//! configuration artifact. Output is a pure function of `(store, workers)`.

pub mod directive;
pub mod templates;

use crate::error::CompileError;
use crate::global::{GlobalPluginStore, RouteMatch};
use directive::{write_directive, SectionWriter};
use serde::Serialize;

pub const KEY_INCLUDE: &str = "fluent.conf";
pub const KEY_SYSTEM: &str = "system.conf";
pub const KEY_APP: &str = "app.conf";
pub const KEY_LOG: &str = "log.conf";

/// Artifact keys in lexical order.
pub const ARTIFACT_KEYS: [&str; 4] = [KEY_APP, KEY_INCLUDE, KEY_LOG, KEY_SYSTEM];

const MATCH_ALL: &str = "**";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedConfig {
    pub include: String,
    pub system: String,
    pub main: String,
    pub log: String,
}

impl RenderedConfig {
    /// `(key, content)` pairs in [`ARTIFACT_KEYS`] order.
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            (KEY_APP, self.main.as_str()),
            (KEY_INCLUDE, self.include.as_str()),
            (KEY_LOG, self.log.as_str()),
            (KEY_SYSTEM, self.system.as_str()),
        ]
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries().into_iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// BLAKE3 over every entry, hex-encoded.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (key, content) in self.entries() {
            hasher.update(key.as_bytes());
            hasher.update(&[0]);
            hasher.update(&(content.len() as u64).to_le_bytes());
            hasher.update(content.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Render `store` for an agent running `workers` worker processes.
pub fn render(store: &GlobalPluginStore, workers: u32) -> Result<RenderedConfig, CompileError> {
    Ok(RenderedConfig {
        include: templates::INCLUDE.to_string(),
        system: templates::system(workers),
        main: render_main(store)?,
        log: templates::LOG.to_string(),
    })
}

fn render_main(store: &GlobalPluginStore) -> Result<String, CompileError> {
    let mut w = SectionWriter::new();

    for input in store.inputs() {
        write_directive(&mut w, "source", None, input)?;
    }

    if store.route_count() > 0 {
        w.open("match", Some(MATCH_ALL));
        w.line("@type", "label_router");
        w.line("@id", store.name());
        for (label, resources) in store.routes() {
            w.open("route", None);
            w.line("@label", label);
            write_route_match(&mut w, &resources.route);
            w.close("route");
        }
        w.close("match");

        for (label, resources) in store.routes() {
            w.open("label", Some(label));
            for filter in &resources.filters {
                write_directive(&mut w, "filter", Some(filter.tag.as_deref().unwrap_or(MATCH_ALL)), filter)?;
            }
            for output in &resources.outputs {
                write_directive(&mut w, "match", Some(output.tag.as_deref().unwrap_or(MATCH_ALL)), output)?;
            }
            w.close("label");
        }
    }

    Ok(w.finish())
}

fn write_route_match(w: &mut SectionWriter, route: &RouteMatch) {
    if route.is_empty() {
        return;
    }
    w.open("match", None);
    if !route.labels.is_empty() {
        let labels: Vec<String> = route.labels.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
        w.line("labels", &labels.join(","));
    }
    if !route.namespaces.is_empty() {
        w.line("namespaces", &route.namespaces.join(","));
    }
    if !route.hosts.is_empty() {
        w.line("hosts", &route.hosts.join(","));
    }
    if !route.container_names.is_empty() {
        w.line("container_names", &route.container_names.join(","));
    }
    w.close("match");
}
