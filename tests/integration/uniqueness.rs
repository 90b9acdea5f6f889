use crate::support::*;
use fluentconf::model::{ConfigFragment, PluginDirective, PluginKind};
use fluentconf::selector::LabelSelector;
use fluentconf::store::MemoryStore;
use fluentconf::types::Scope;

fn claiming(namespace: &str, name: &str, label: &str) -> ConfigFragment {
    let mut fragment = selected(ConfigFragment::namespaced(namespace, name))
        .with_output_selector(LabelSelector::with_labels([("role", "output")]));
    fragment.route_label = Some(label.to_string());
    fragment
}

fn store_with_outputs() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_agent(agent());
    for ns in ["team-a", "team-b"] {
        store.add_plugin(plugin(
            Scope::Namespaced,
            PluginKind::Output,
            Some(ns),
            "console",
            "output",
            PluginDirective::new("stdout"),
        ));
    }
    store
}

#[test]
fn first_fragment_by_identity_keeps_the_label() {
    let store = store_with_outputs();
    let second = claiming("team-b", "app", "@shared");
    let first = claiming("team-a", "app", "@shared");
    store.add_fragment(second.clone());
    store.add_fragment(first.clone());

    let (report, artifacts) = compile(&store);
    let agent_report = report.agent(&agent_ref()).unwrap();
    assert_eq!(agent_report.routes(), 1);
    assert_eq!(agent_report.error_count(), 1);

    let loser = store.status_of(&second.object_ref()).unwrap();
    assert!(loser.contains("already exists"), "{}", loser);
    assert!(store.status_of(&first.object_ref()).is_none());

    let main = artifacts.get(&agent_ref()).unwrap().main;
    assert_eq!(main.matches("<label @shared>").count(), 1);
    assert!(main.contains("namespaces team-a\n"));
    assert!(!main.contains("team-b"));
}

#[test]
fn labels_reset_between_agents() {
    let store = store_with_outputs();
    let mut other = agent();
    other.name = "other".to_string();
    store.add_agent(other);
    store.add_fragment(claiming("team-a", "app", "@shared"));

    let (report, _) = compile(&store);
    assert_eq!(report.agents.len(), 2);
    for agent_report in &report.agents {
        assert_eq!(agent_report.routes(), 1);
        assert_eq!(agent_report.error_count(), 0);
    }
}

#[test]
fn derived_labels_never_collide_across_scopes() {
    let store = store_with_outputs();
    store.add_fragment(selected(ConfigFragment::namespaced("team-a", "app")));
    store.add_fragment(selected(ConfigFragment::cluster("app")));

    let (report, _) = compile(&store);
    let agent_report = report.agent(&agent_ref()).unwrap();
    assert_eq!(agent_report.routes(), 2);
    assert_eq!(agent_report.error_count(), 0);
}
