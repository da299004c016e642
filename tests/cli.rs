mod common;
use common::*;

use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) {
    std::fs::write(dir.path().join(name), contents).expect("failed to write fixture");
}

#[test]
fn version_command_prints_one_version() {
    let dir = TempDir::new().unwrap();
    let out = realign_ok(
        dir.path(),
        &["version", "1.2.GA-foo-1", "--incremental", "foo", "--candidate", "1.2.GA-foo-9"],
    );
    assert_eq!(out.trim(), "1.2.GA-foo-10");
}

#[test]
fn align_writes_report_and_reactor() {
    let dir = TempDir::new().unwrap();
    write(&dir, "reactor.json", SHARED_PROPERTY_REACTOR);
    write(&dir, "bom.json", r#"{"org.b:tool": "1.2.0.redhat-1", "org.x:x": "1.0.redhat-1"}"#);
    write(
        &dir,
        "realign.toml",
        "[versioning]\nsuffix = \"redhat-1\"\n[alignment]\nprecedence = \"bom\"\n",
    );

    let stdout = realign_ok(
        dir.path(),
        &["align", "--reactor", "reactor.json", "--bom", "bom.json", "--format", "json", "--output", "out.json"],
    );
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("report should be JSON");
    assert!(report["changes"].as_array().is_some_and(|c| !c.is_empty()));

    let aligned = reactor(&std::fs::read_to_string(dir.path().join("out.json")).unwrap());
    let root = aligned.module(realign::model::ModuleId(0));
    assert_eq!(root.version.as_deref(), Some("1.0.0.redhat-1"));
    assert_eq!(root.base.properties["foo.version"], "1.0.redhat-1");
}

#[test]
fn align_failure_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write(&dir, "reactor.json", SHARED_PROPERTY_REACTOR);
    write(&dir, "bom.json", r#"["org.b:tool:3.0.redhat-1"]"#);
    write(
        &dir,
        "realign.toml",
        "[alignment]\nprecedence = \"bom\"\n[alignment.strict]\nenabled = true\nfail_on_violation = true\nrebuild_suffix = \"redhat\"\n",
    );

    let out = realign_in(
        dir.path(),
        &["align", "--reactor", "reactor.json", "--bom", "bom.json", "--output", "out.json"],
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("org.b:tool"), "{stderr}");
    assert!(stderr.contains("To fix:"), "{stderr}");
    assert!(!dir.path().join("out.json").exists());
}

#[test]
fn rest_request_lists_gavs() {
    let dir = TempDir::new().unwrap();
    write(&dir, "reactor.json", SHARED_PROPERTY_REACTOR);
    let stdout = realign_ok(dir.path(), &["rest-request", "--reactor", "reactor.json"]);
    let request: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    let gavs: Vec<String> = request
        .iter()
        .map(|g| format!("{}:{}:{}", g["groupId"].as_str().unwrap(), g["artifactId"].as_str().unwrap(), g["version"].as_str().unwrap()))
        .collect();
    assert_eq!(
        gavs,
        ["org.app:core:1.0", "org.app:parent:1.0", "org.b:tool:1.2", "org.x:x:1.0", "org.y:y:1.0"]
    );
}
