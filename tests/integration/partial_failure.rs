use crate::support::*;
use fluentconf::error::StoreError;
use fluentconf::model::{ConfigFragment, ParamValue, PluginDirective, PluginKind};
use fluentconf::routing::routing_label;
use fluentconf::selector::LabelSelector;
use fluentconf::store::MemoryStore;
use fluentconf::types::Scope;
use fluentconf::CompileError;

fn healthy(store: &MemoryStore) -> ConfigFragment {
    store.add_plugin(plugin(
        Scope::Namespaced,
        PluginKind::Output,
        Some("team-a"),
        "console",
        "output",
        PluginDirective::new("stdout"),
    ));
    let fragment = selected(ConfigFragment::namespaced("team-a", "good"))
        .with_output_selector(LabelSelector::with_labels([("role", "output")]));
    store.add_fragment(fragment.clone());
    fragment
}

#[test]
fn malformed_fragment_selector_excludes_only_that_fragment() {
    let store = MemoryStore::new();
    store.add_agent(agent());
    let good = healthy(&store);
    let bad = selected(ConfigFragment::namespaced("team-a", "bad"))
        .with_filter_selector(LabelSelector::default().with_expression("role", "Matches", &["x"]));
    store.add_fragment(bad.clone());

    let (report, artifacts) = compile(&store);
    let agent_report = report.agent(&agent_ref()).unwrap();
    assert!(!agent_report.skipped);
    assert_eq!(agent_report.routes(), 1);
    assert_eq!(agent_report.error_count(), 1);

    let status = store.status_of(&bad.object_ref()).unwrap();
    assert!(status.contains("invalid selector"), "{}", status);

    let main = artifacts.get(&agent_ref()).unwrap().main;
    assert!(main.contains(&format!("<label {}>", routing_label(&good))));
    assert!(!main.contains(&routing_label(&bad)));
}

#[test]
fn missing_secret_drops_the_directive_and_keeps_the_route() {
    let store = MemoryStore::new();
    store.add_agent(agent());
    healthy(&store);
    store.add_plugin(plugin(
        Scope::Namespaced,
        PluginKind::Output,
        Some("team-a"),
        "elastic",
        "output",
        PluginDirective::new("elasticsearch").with_param("password", ParamValue::secret("es-creds", "password")),
    ));

    let (report, artifacts) = compile(&store);
    let agent_report = report.agent(&agent_ref()).unwrap();
    assert_eq!(agent_report.error_count(), 1);
    assert_eq!(agent_report.fragments[0].outputs, 1);

    let main = artifacts.get(&agent_ref()).unwrap().main;
    assert!(main.contains("@type stdout"));
    assert!(!main.contains("elasticsearch"));
}

#[test]
fn resolved_secret_is_rendered_inline() {
    let store = MemoryStore::new();
    store.add_agent(agent());
    store.add_secret("logging", "es-creds", "password", "hunter2");
    healthy(&store);
    store.add_plugin(plugin(
        Scope::Namespaced,
        PluginKind::Output,
        Some("team-a"),
        "elastic",
        "output",
        PluginDirective::new("elasticsearch").with_param("password", ParamValue::secret("es-creds", "password")),
    ));

    let main = rendered(&store).main;
    assert!(main.contains("    password hunter2\n"));
    assert!(store.statuses().is_empty());
}

#[test]
fn malformed_agent_selector_skips_the_artifact() {
    let store = MemoryStore::new();
    let mut a = agent();
    a.fragment_selector = LabelSelector::default().with_expression("tier", "In", &[]);
    store.add_agent(a);
    healthy(&store);

    let (report, artifacts) = compile(&store);
    let agent_report = report.agent(&agent_ref()).unwrap();
    assert!(agent_report.skipped);
    assert!(agent_report.error.is_some());
    assert!(artifacts.get(&agent_ref()).is_none());
    assert!(store.status_of(&agent_ref()).is_some());
}

#[test]
fn transient_failure_fails_the_pass_until_the_store_recovers() {
    let store = MemoryStore::new();
    store.add_agent(agent());
    healthy(&store);
    store.fail_listings(Some(StoreError::Transient("connection refused".to_string())));

    let artifacts = fluentconf::materialize::MemoryMaterializer::new();
    let err = fluentconf::Compiler::with_backend(&store, &artifacts)
        .run_pass()
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, CompileError::ListTransient(_)));
    assert!(artifacts.is_empty());

    store.fail_listings(None);
    let (report, artifacts) = compile(&store);
    assert_eq!(report.error_count(), 0);
    assert_eq!(artifacts.len(), 1);
}
