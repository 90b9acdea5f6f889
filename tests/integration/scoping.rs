use crate::support::*;
use fluentconf::model::{ConfigFragment, PluginDirective, PluginKind};
use fluentconf::selector::LabelSelector;
use fluentconf::store::MemoryStore;
use fluentconf::types::Scope;

fn store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_agent(agent());
    store.add_namespace("team-a");
    store.add_namespace("team-b");
    store.add_plugin(plugin(
        Scope::Cluster,
        PluginKind::Output,
        None,
        "console",
        "output",
        PluginDirective::new("stdout"),
    ));
    store
}

fn cluster_fragment(name: &str) -> ConfigFragment {
    selected(ConfigFragment::cluster(name))
        .with_output_selector(LabelSelector::with_labels([("role", "output")]))
}

#[test]
fn cluster_fragment_without_list_watches_every_namespace() {
    let store = store();
    store.add_fragment(cluster_fragment("all"));

    let main = rendered(&store).main;
    assert!(main.contains("namespaces logging,team-a,team-b\n"), "{}", main);
    assert_eq!(store.namespace_list_calls(), 1);
}

#[test]
fn namespace_listing_is_fetched_once_per_pass() {
    let store = store();
    store.add_fragment(cluster_fragment("first"));
    store.add_fragment(cluster_fragment("second"));
    let mut other = agent();
    other.name = "other".to_string();
    store.add_agent(other);

    let (report, _) = compile(&store);
    assert_eq!(report.agents.len(), 2);
    assert_eq!(store.namespace_list_calls(), 1);
}

#[test]
fn explicit_namespaces_skip_the_listing() {
    let store = store();
    let mut fragment = cluster_fragment("picky");
    fragment.watched_namespaces = vec!["team-b".to_string()];
    store.add_fragment(fragment);

    let main = rendered(&store).main;
    assert!(main.contains("namespaces team-b\n"));
    assert_eq!(store.namespace_list_calls(), 0);
}

#[test]
fn namespaced_fragment_watches_its_own_namespace() {
    let store = store();
    store.add_plugin(plugin(
        Scope::Namespaced,
        PluginKind::Output,
        Some("team-b"),
        "local",
        "output",
        PluginDirective::new("stdout"),
    ));
    store.add_fragment(
        selected(ConfigFragment::namespaced("team-b", "app"))
            .with_output_selector(LabelSelector::with_labels([("role", "output")])),
    );

    let main = rendered(&store).main;
    assert!(main.contains("namespaces team-b\n"));
    assert_eq!(store.namespace_list_calls(), 0);
}

#[test]
fn watched_labels_hosts_and_containers_render_in_route_match() {
    let store = store();
    let mut fragment = cluster_fragment("narrow");
    fragment.watched_namespaces = vec!["team-a".to_string()];
    fragment.watched_labels = labels(&[("app", "web")]);
    fragment.watched_hosts = vec!["node-1".to_string()];
    fragment.watched_containers = vec!["nginx".to_string(), "sidecar".to_string()];
    store.add_fragment(fragment);

    let main = rendered(&store).main;
    assert!(main.contains(
        "    <match>\n      labels app:web\n      namespaces team-a\n      hosts node-1\n      container_names nginx,sidecar\n    </match>\n"
    ));
}
