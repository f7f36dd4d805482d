//! End-to-end runs of the default rule set through the engine

use std::path::{Path, PathBuf};

use recast_core::{Configuration, Engine};
use recast_rules::builtin_registry;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn run(config: Configuration) -> recast_core::ProcessResult {
    let registry = builtin_registry(&config).unwrap();
    Engine::new(config, registry).run().unwrap()
}

#[test]
fn migration_scenario_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "app.rcs",
        "\
class AnotherClass {
}

fn run() {
    return \"AnotherClass\";
}
",
    );

    let config = Configuration {
        paths: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let result = run(config.clone());

    assert!(!result.has_errors());
    assert_eq!(result.file_diffs.len(), 1);
    assert!(
        std::fs::read_to_string(&path)
            .unwrap()
            .contains("return AnotherClass::class;")
    );

    // A second run over the migrated tree has nothing left to do.
    let second = run(config);
    assert!(!second.has_errors());
    assert!(second.file_diffs.is_empty());
}

#[test]
fn full_rule_set_composes_in_one_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "app.rcs",
        "\
class AnotherClass {
}

fn run(value) {
    ;
    debug_log(value);
    let greeting = concat(\"hello \", concat(\"new \", \"world\"));
    let check = is_a(\"AnotherClass\", value);
    return \"AnotherClass\";
}
",
    );

    let config = Configuration {
        paths: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let result = run(config);

    assert!(!result.has_errors());
    let output = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        output,
        "\
class AnotherClass {
}

fn run(value) {
    let greeting = \"hello new world\";
    let check = is_a(\"AnotherClass\", value);
    return AnotherClass::class;
}
"
    );
}

#[test]
fn dry_run_previews_without_touching_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = "fn run(x) {\n    debug_log(x);\n    return x;\n}\n";
    let path = write_file(dir.path(), "app.rcs", source);

    let config = Configuration {
        paths: vec![dir.path().to_path_buf()],
        dry_run: true,
        ..Default::default()
    };
    let result = run(config);

    assert_eq!(result.file_diffs.len(), 1);
    assert!(result.file_diffs[0].diff.contains("-    debug_log(x);"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn language_level_gates_the_class_name_rule() {
    let dir = tempfile::tempdir().unwrap();
    let source = "\
class AnotherClass {
}

fn run() {
    return \"AnotherClass\";
}
";
    let path = write_file(dir.path(), "app.rcs", source);

    let config = Configuration {
        paths: vec![dir.path().to_path_buf()],
        language_level: 54,
        ..Default::default()
    };
    let result = run(config);

    assert!(result.file_diffs.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn rule_configuration_flows_through() {
    let dir = tempfile::tempdir().unwrap();
    let source = "\
class AnotherClass {
}

fn run() {
    return \"AnotherClass\";
}
";
    let path = write_file(dir.path(), "app.rcs", source);

    let mut config = Configuration {
        paths: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let options = config
        .rules
        .entry("string-class-name-to-const".to_string())
        .or_default();
    options
        .params
        .insert("skip".to_string(), serde_json::json!(["AnotherClass"]));

    let result = run(config);
    assert!(result.file_diffs.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn configured_constant_renames_apply() {
    let dir = tempfile::tempdir().unwrap();
    let source = "fn limit() {\n    return Config::OLD;\n}\n";
    let path = write_file(dir.path(), "app.rcs", source);

    let mut config = Configuration {
        paths: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let options = config
        .rules
        .entry("rename-class-constants".to_string())
        .or_default();
    options.params.insert(
        "renames".to_string(),
        serde_json::json!({ "Config": { "OLD": "NEW" } }),
    );

    let result = run(config);
    assert!(!result.has_errors());
    assert_eq!(result.file_diffs.len(), 1);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "fn limit() {\n    return Config::NEW;\n}\n"
    );
}
