use crate::support::*;
use fluentconf::model::{ConfigFragment, ParamValue, PluginDirective, PluginKind, PluginResource};
use fluentconf::selector::LabelSelector;
use fluentconf::store::MemoryStore;
use fluentconf::types::Scope;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Object {
    Fragment(ConfigFragment),
    Plugin(PluginResource),
}

fn objects() -> Vec<Object> {
    let mut objects = Vec::new();
    for ns in ["team-a", "team-b", "team-c"] {
        objects.push(Object::Fragment(
            selected(ConfigFragment::namespaced(ns, "app"))
                .with_filter_selector(LabelSelector::with_labels([("role", "filter")]))
                .with_output_selector(LabelSelector::with_labels([("role", "output")])),
        ));
        objects.push(Object::Plugin(plugin(
            Scope::Namespaced,
            PluginKind::Filter,
            Some(ns),
            "tag-team",
            "filter",
            PluginDirective::new("recordTransformer")
                .with_param("key", ParamValue::text("team"))
                .with_param("value", ParamValue::text(ns)),
        )));
        objects.push(Object::Plugin(plugin(
            Scope::Namespaced,
            PluginKind::Output,
            Some(ns),
            "console",
            "output",
            PluginDirective::new("stdout"),
        )));
    }
    objects.push(Object::Fragment(
        selected(ConfigFragment::cluster("audit"))
            .with_output_selector(LabelSelector::with_labels([("role", "output")])),
    ));
    objects.push(Object::Plugin(plugin(
        Scope::Cluster,
        PluginKind::Output,
        None,
        "archive",
        "output",
        PluginDirective::new("s3").with_param("bucket", ParamValue::text("logs")),
    )));
    objects.push(Object::Plugin(plugin(
        Scope::Cluster,
        PluginKind::Filter,
        None,
        "drop-debug",
        "filter",
        PluginDirective::new("grep"),
    )));
    objects
}

fn store_from(order: &[Object]) -> MemoryStore {
    let store = MemoryStore::new();
    store.add_agent(agent());
    for object in order {
        match object.clone() {
            Object::Fragment(fragment) => store.add_fragment(fragment),
            Object::Plugin(resource) => store.add_plugin(resource),
        }
    }
    store
}

#[test]
fn repeated_passes_render_identically() {
    let store = store_from(&objects());
    let first = rendered(&store);
    let second = rendered(&store);
    assert_eq!(first, second);
    assert_eq!(first.digest(), second.digest());
}

#[test]
fn unchanged_artifact_is_not_rewritten() {
    let store = store_from(&objects());
    let temp = tempfile::tempdir().unwrap();
    let materializer = fluentconf::materialize::DirectoryMaterializer::new(temp.path());
    let compiler = fluentconf::Compiler::with_backend(&store, &materializer);

    assert_eq!(compiler.run_pass().unwrap().written(), 1);
    assert_eq!(compiler.run_pass().unwrap().written(), 0);

    let fresh = fluentconf::materialize::DirectoryMaterializer::new(temp.path());
    let report = fluentconf::Compiler::with_backend(&store, &fresh).run_pass().unwrap();
    assert_eq!(report.written(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn insertion_order_does_not_change_output(order in Just(objects()).prop_shuffle()) {
        let expected = rendered(&store_from(&objects()));
        let actual = rendered(&store_from(&order));
        prop_assert_eq!(actual, expected);
    }
}
