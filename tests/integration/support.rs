use fluentconf::materialize::MemoryMaterializer;
use fluentconf::model::{Agent, ConfigFragment, PluginDirective, PluginKind, PluginResource};
use fluentconf::selector::LabelSelector;
use fluentconf::store::MemoryStore;
use fluentconf::types::{Labels, ObjectKind, ObjectRef, Scope};
use fluentconf::{Compiler, PassReport, RenderedConfig};

pub const SELECT_KEY: &str = "config.fluentd.fluent.io/enabled";

pub fn labels(pairs: &[(&str, &str)]) -> Labels {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

pub fn agent_ref() -> ObjectRef {
    ObjectRef::namespaced(ObjectKind::Agent, "logging", "fd")
}

/// Agent `logging/fd` selecting fragments labelled `SELECT_KEY=true`.
pub fn agent() -> Agent {
    let mut agent = Agent::new("logging", "fd");
    agent.fragment_selector = LabelSelector::with_labels([(SELECT_KEY, "true")]);
    agent
}

pub fn selected(fragment: ConfigFragment) -> ConfigFragment {
    let mut labels = fragment.labels.clone();
    labels.insert(SELECT_KEY.to_string(), "true".to_string());
    fragment.with_labels(labels)
}

pub fn plugin(
    scope: Scope,
    kind: PluginKind,
    namespace: Option<&str>,
    name: &str,
    role: &str,
    directive: PluginDirective,
) -> PluginResource {
    PluginResource::new(scope, kind, namespace, name)
        .with_labels(labels(&[("role", role)]))
        .with_directive(directive)
}

pub fn compile(store: &MemoryStore) -> (PassReport, MemoryMaterializer) {
    let artifacts = MemoryMaterializer::new();
    let report = Compiler::with_backend(store, &artifacts).run_pass().unwrap();
    (report, artifacts)
}

pub fn rendered(store: &MemoryStore) -> RenderedConfig {
    let (_, artifacts) = compile(store);
    artifacts.get(&agent_ref()).expect("agent artifact")
}
