use crate::support::*;
use fluentconf::materialize::DirectoryMaterializer;
use fluentconf::model::{Agent, ConfigFragment, ParamValue, PluginDirective, PluginKind};
use fluentconf::render::templates;
use fluentconf::routing::routing_label;
use fluentconf::selector::LabelSelector;
use fluentconf::store::MemoryStore;
use fluentconf::types::{ObjectKind, ObjectRef, Scope};
use fluentconf::Compiler;

fn scenario() -> (MemoryStore, ConfigFragment) {
    let store = MemoryStore::new();
    let mut agent = Agent::new("logging", "A");
    agent.fragment_selector = LabelSelector::with_labels([(SELECT_KEY, "true")]);
    store.add_agent(agent);

    let fragment = selected(ConfigFragment::namespaced("team-a", "F"))
        .with_filter_selector(LabelSelector::with_labels([("role", "filter")]))
        .with_output_selector(LabelSelector::with_labels([("role", "output")]));
    store.add_fragment(fragment.clone());
    store.add_plugin(plugin(
        Scope::Namespaced,
        PluginKind::Filter,
        Some("team-a"),
        "add-k",
        "filter",
        PluginDirective::new("recordTransformer")
            .with_param("key", ParamValue::text("k"))
            .with_param("value", ParamValue::text("v")),
    ));
    store.add_plugin(plugin(
        Scope::Namespaced,
        PluginKind::Output,
        Some("team-a"),
        "console",
        "output",
        PluginDirective::new("stdout"),
    ));
    (store, fragment)
}

#[test]
fn single_fragment_renders_one_labelled_section() {
    let (store, fragment) = scenario();
    let (report, artifacts) = compile(&store);
    assert_eq!(report.error_count(), 0);

    let owner = ObjectRef::namespaced(ObjectKind::Agent, "logging", "A");
    assert_eq!(artifacts.artifact_name(&owner).as_deref(), Some("A-config"));
    let rendered = artifacts.get(&owner).unwrap();
    let label = routing_label(&fragment);

    let expected = format!(
        "\
<match **>
  @type label_router
  @id main
  <route>
    @label {label}
    <match>
      namespaces team-a
    </match>
  </route>
</match>
<label {label}>
  <filter **>
    @type record_transformer
    @id namespaced::team-a::F::namespaced::filter::add-k-0
    <record>
      k v
    </record>
  </filter>
  <match **>
    @type stdout
    @id namespaced::team-a::F::namespaced::output::console-0
  </match>
</label>
",
        label = label
    );
    assert_eq!(rendered.main, expected);
    assert_eq!(rendered.include, templates::INCLUDE);
    assert_eq!(rendered.log, templates::LOG);
    assert!(rendered.system.contains("\tworkers 1\n"));
    assert!(!rendered.system.contains("root_dir"));
}

#[test]
fn manifests_to_directory_artifact() {
    let temp = tempfile::tempdir().unwrap();
    let manifests = temp.path().join("manifests");
    std::fs::create_dir_all(&manifests).unwrap();
    std::fs::write(
        manifests.join("00-agent.yaml"),
        r#"
kind: Agent
name: A
namespace: logging
fragmentSelector:
  matchLabels:
    config.fluentd.fluent.io/enabled: "true"
globalInputs:
  - kind: forward
    params:
      bind: 0.0.0.0
      port: 24224
"#,
    )
    .unwrap();
    std::fs::write(
        manifests.join("10-team-a.yaml"),
        r#"
kind: Fragment
name: F
namespace: team-a
labels:
  config.fluentd.fluent.io/enabled: "true"
filterSelector:
  matchLabels:
    role: filter
outputSelector:
  matchLabels:
    role: output
---
kind: Filter
name: add-k
namespace: team-a
labels:
  role: filter
directives:
  - kind: recordTransformer
    params:
      key: k
      value: v
---
kind: Output
name: console
namespace: team-a
labels:
  role: output
directives:
  - kind: stdout
"#,
    )
    .unwrap();

    let store = MemoryStore::from_manifests(&manifests).unwrap();
    let out = temp.path().join("out");
    let materializer = DirectoryMaterializer::new(&out);
    let report = Compiler::with_backend(&store, &materializer).run_pass().unwrap();
    assert_eq!(report.written(), 1);

    let dir = out.join("logging").join("A-config");
    let app = std::fs::read_to_string(dir.join("app.conf")).unwrap();
    assert!(app.starts_with(
        "<source>\n  @type forward\n  @id main::input::forward::0\n  bind 0.0.0.0\n  port 24224\n</source>\n"
    ));
    assert!(app.contains("    @type record_transformer\n"));
    assert!(app.contains("      k v\n"));
    assert_eq!(
        std::fs::read_to_string(dir.join("fluent.conf")).unwrap(),
        templates::INCLUDE
    );
    assert_eq!(std::fs::read_to_string(dir.join("log.conf")).unwrap(), templates::LOG);
}

#[test]
fn agent_without_fragments_renders_inputs_only() {
    let store = MemoryStore::new();
    let mut a = agent();
    a.global_inputs = vec![PluginDirective::new("forward")];
    store.add_agent(a);

    let rendered = rendered(&store);
    assert_eq!(
        rendered.main,
        "<source>\n  @type forward\n  @id main::input::forward::0\n</source>\n"
    );
}

#[test]
fn agent_with_nothing_renders_empty_main() {
    let store = MemoryStore::new();
    store.add_agent(agent());
    assert_eq!(rendered(&store).main, "");
}
