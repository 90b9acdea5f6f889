use crate::support::*;
use fluentconf::model::{ConfigFragment, PluginDirective, PluginKind};
use fluentconf::selector::LabelSelector;
use fluentconf::store::MemoryStore;
use fluentconf::types::Scope;

fn seed(store: &MemoryStore) {
    store.add_agent(agent());
    store.add_plugin(plugin(
        Scope::Cluster,
        PluginKind::Filter,
        None,
        "a-cluster-grep",
        "filter",
        PluginDirective::new("grep"),
    ));
    store.add_plugin(plugin(
        Scope::Namespaced,
        PluginKind::Filter,
        Some("team-a"),
        "z-local-grep",
        "filter",
        PluginDirective::new("grep"),
    ));
    store.add_plugin(plugin(
        Scope::Cluster,
        PluginKind::Output,
        None,
        "archive",
        "output",
        PluginDirective::new("s3"),
    ));
    store.add_plugin(plugin(
        Scope::Namespaced,
        PluginKind::Output,
        Some("team-a"),
        "console",
        "output",
        PluginDirective::new("stdout"),
    ));
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} missing from:\n{}", needle, haystack))
}

#[test]
fn namespaced_resources_precede_cluster_resources() {
    let store = MemoryStore::new();
    seed(&store);
    store.add_fragment(
        selected(ConfigFragment::namespaced("team-a", "app"))
            .with_filter_selector(LabelSelector::with_labels([("role", "filter")]))
            .with_output_selector(LabelSelector::with_labels([("role", "output")])),
    );

    let main = rendered(&store).main;
    let local_filter = position(&main, "@id namespaced::team-a::app::namespaced::filter::z-local-grep-0");
    let cluster_filter = position(&main, "@id namespaced::team-a::app::cluster::filter::a-cluster-grep-0");
    let local_output = position(&main, "@id namespaced::team-a::app::namespaced::output::console-0");
    let cluster_output = position(&main, "@id namespaced::team-a::app::cluster::output::archive-0");
    assert!(local_filter < cluster_filter);
    assert!(cluster_filter < local_output);
    assert!(local_output < cluster_output);
}

#[test]
fn cluster_fragment_ignores_namespaced_resources() {
    let store = MemoryStore::new();
    seed(&store);
    store.add_fragment(
        selected(ConfigFragment::cluster("all"))
            .with_filter_selector(LabelSelector::with_labels([("role", "filter")]))
            .with_output_selector(LabelSelector::with_labels([("role", "output")])),
    );

    let main = rendered(&store).main;
    assert!(main.contains("@id cluster::all::cluster::filter::a-cluster-grep-0"));
    assert!(main.contains("@id cluster::all::cluster::output::archive-0"));
    assert!(!main.contains("z-local-grep"));
    assert!(!main.contains("console"));
}

#[test]
fn namespaced_fragment_does_not_see_other_namespaces() {
    let store = MemoryStore::new();
    seed(&store);
    store.add_plugin(plugin(
        Scope::Namespaced,
        PluginKind::Output,
        Some("team-b"),
        "foreign",
        "output",
        PluginDirective::new("stdout"),
    ));
    store.add_fragment(
        selected(ConfigFragment::namespaced("team-a", "app"))
            .with_output_selector(LabelSelector::with_labels([("role", "output")])),
    );

    let main = rendered(&store).main;
    assert!(!main.contains("foreign"));
    assert!(main.contains("console-0"));
}
