use fluentconf::config::CompilerConfig;
use fluentconf::tooling::cli::{CliContext, Commands};
use std::path::Path;

const MANIFESTS: &str = r#"
kind: Agent
name: fd
namespace: logging
fragmentSelector:
  matchLabels:
    config.fluentd.fluent.io/enabled: "true"
---
kind: Fragment
name: app
namespace: team-a
labels:
  config.fluentd.fluent.io/enabled: "true"
outputSelector:
  matchLabels:
    role: output
---
kind: Output
name: console
namespace: team-a
labels:
  role: output
directives:
  - kind: stdout
"#;

const BROKEN_FRAGMENT: &str = r#"
kind: Fragment
name: broken
namespace: team-a
labels:
  config.fluentd.fluent.io/enabled: "true"
filterSelector:
  matchExpressions:
    - key: role
      operator: Near
      values: [x]
"#;

fn context(dir: &Path, extra: Option<&str>) -> CliContext {
    let manifests = dir.join("manifests");
    std::fs::create_dir_all(&manifests).unwrap();
    std::fs::write(manifests.join("10-base.yaml"), MANIFESTS).unwrap();
    if let Some(extra) = extra {
        std::fs::write(manifests.join("20-extra.yaml"), extra).unwrap();
    }
    let mut config = CompilerConfig::default();
    config.manifests = manifests;
    config.output_dir = dir.join("out");
    config.retry.max_attempts = 1;
    CliContext::from_config(config)
}

#[test]
fn check_reports_json_and_succeeds_on_clean_manifests() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(temp.path(), None);
    let output = ctx
        .execute(&Commands::Check {
            format: "json".to_string(),
        })
        .unwrap();
    assert_eq!(output.exit_code, 0);

    let json: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(json["agents"][0]["artifact"], "fd-config");
    assert_eq!(json["agents"][0]["fragments"][0]["outputs"], 1);
    assert!(json["agents"][0].get("rendered").is_none());
    assert!(!temp.path().join("out").exists());
}

#[test]
fn check_exits_non_zero_on_fragment_errors() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(temp.path(), Some(BROKEN_FRAGMENT));
    let output = ctx
        .execute(&Commands::Check {
            format: "text".to_string(),
        })
        .unwrap();
    assert_eq!(output.exit_code, 1);
    assert!(output.text.contains("invalid selector"));
}

#[test]
fn compile_writes_artifacts_and_tolerates_fragment_errors() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(temp.path(), Some(BROKEN_FRAGMENT));
    let output = ctx
        .execute(&Commands::Compile {
            out: None,
            format: "json".to_string(),
        })
        .unwrap();
    assert_eq!(output.exit_code, 0);
    let dir = temp.path().join("out").join("logging").join("fd-config");
    for key in ["app.conf", "fluent.conf", "log.conf", "system.conf"] {
        assert!(dir.join(key).is_file(), "{} missing", key);
    }
}

#[test]
fn render_prints_a_single_key() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(temp.path(), None);
    let output = ctx
        .execute(&Commands::Render {
            agent: "logging/fd".to_string(),
            key: Some("app.conf".to_string()),
        })
        .unwrap();
    assert_eq!(output.exit_code, 0);
    assert!(output.text.starts_with("<match **>\n  @type label_router\n"));
    assert!(output.text.contains("@type stdout"));

    let all = ctx
        .execute(&Commands::Render {
            agent: "logging/fd".to_string(),
            key: None,
        })
        .unwrap();
    assert!(all.text.starts_with("# ==> app.conf <==\n"));
    assert!(all.text.contains("# ==> system.conf <==\n"));
}

#[test]
fn render_rejects_unknown_agents_and_keys() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(temp.path(), None);
    assert!(ctx
        .execute(&Commands::Render {
            agent: "logging/missing".to_string(),
            key: None,
        })
        .is_err());
    assert!(ctx
        .execute(&Commands::Render {
            agent: "logging/fd".to_string(),
            key: Some("main.conf".to_string()),
        })
        .is_err());
}

#[test]
fn invalid_format_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(temp.path(), None);
    assert!(ctx
        .execute(&Commands::Check {
            format: "yaml".to_string(),
        })
        .is_err());
}

#[test]
fn missing_manifest_path_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = CompilerConfig::default();
    config.manifests = temp.path().join("absent");
    let ctx = CliContext::from_config(config);
    assert!(ctx
        .execute(&Commands::Check {
            format: "text".to_string(),
        })
        .is_err());
}
