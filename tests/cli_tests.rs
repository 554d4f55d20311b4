//! Integration tests for the autowire CLI
//!
//! These tests run the actual binary against scene files written to a
//! temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value as Json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the binary to test
fn autowire_cmd() -> Command {
    let mut cmd = Command::cargo_bin("autowire").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn write_scene(dir: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, yaml).unwrap();
    path
}

fn wire_json(args: &[&str]) -> Json {
    let output = autowire_cmd().arg("wire").args(args).arg("--json").output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

const BOUND_SCENE: &str = r#"
schema: autowire/scene@0.1
bound: App.ViewModels.MainPageViewModel
types:
  - name: App.ViewModels.MainPageViewModel
    properties:
      - { name: Title_Text, value: "Orders" }
    methods:
      - { name: Save_Click }
tree:
  type: App.Views.MainPage
  name: Root
  children:
    - { type: Controls.TextBlock, name: Title, properties: [{ name: Text, kind: text }] }
    - { type: Controls.Button, name: Save, events: [Click] }
"#;

const DISCOVERY_SCENE: &str = r#"
schema: autowire/scene@0.1
types:
  - name: App.ViewModels.OrdersViewModel
  - name: App.ViewModels.MainPageViewModel
    methods:
      - { name: Root_Loaded }
tree:
  type: App.Views.MainPage
  name: Root
"#;

// ============================================================================
// Naming commands
// ============================================================================

#[test]
fn test_help_flag() {
    autowire_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convention-based UI to view-model wiring"));
}

#[test]
fn test_split_prints_tokens() {
    autowire_cmd()
        .args(["split", "Example_Name_"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"["Example","Name"]"#));
}

#[test]
fn test_rank_prints_common_prefix_length() {
    autowire_cmd()
        .args(["rank", "Save_Button", "SaveButtonClick"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_valid_scene() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "main.yaml", BOUND_SCENE);

    autowire_cmd()
        .arg("validate")
        .arg(&scene)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("Types: 1"))
        .stdout(predicate::str::contains("Nodes: 3"));
}

#[test]
fn test_validate_wrong_schema() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "old.yaml", &BOUND_SCENE.replace("autowire/scene@0.1", "autowire/scene@0.0"));

    autowire_cmd()
        .arg("validate")
        .arg(&scene)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("AW-034"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_validate_conflicting_overrides() {
    let dir = TempDir::new().unwrap();
    let yaml = BOUND_SCENE.replace(
        "bound: App.ViewModels.MainPageViewModel\n",
        "config:\n  discovery:\n    type_override: App.ViewModels.MainPageViewModel\n    name_override: Main\n",
    );
    let scene = write_scene(&dir, "conflict.yaml", &yaml);

    autowire_cmd()
        .arg("validate")
        .arg(&scene)
        .assert()
        .failure()
        .stderr(predicate::str::contains("AW-012"));
}

#[test]
fn test_validate_missing_file() {
    autowire_cmd()
        .args(["validate", "does-not-exist.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// wire
// ============================================================================

#[test]
fn test_wire_prints_bindings() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "main.yaml", BOUND_SCENE);

    autowire_cmd()
        .arg("wire")
        .arg(&scene)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 binding(s)"))
        .stdout(predicate::str::contains("Title.Text <- Title_Text [sync (two-way)]"))
        .stdout(predicate::str::contains("Save.Click <- Save_Click [event]"));
}

#[test]
fn test_wire_json_with_raised_event() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "main.yaml", BOUND_SCENE);
    let scene = scene.to_str().unwrap();

    let report = wire_json(&[scene, "--raise", "Save.Click", "--raise", "Save.Click"]);

    assert_eq!(report["discovery"], Json::Null);
    assert_eq!(report["bindings"].as_array().unwrap().len(), 2);
    assert_eq!(report["raised"][0]["event"], "Save.Click");
    assert_eq!(report["raised"][0]["handlers"], 1);

    let calls = report["calls"].as_array().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["object"], "MainPageViewModel");
    assert_eq!(calls[0]["method"], "Save_Click");
}

#[test]
fn test_wire_runs_discovery_without_bound_type() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "discover.yaml", DISCOVERY_SCENE);

    let report = wire_json(&[scene.to_str().unwrap()]);

    assert_eq!(report["discovery"]["type"], "App.ViewModels.MainPageViewModel");
    assert_eq!(report["discovery"]["tier"], "exact_from_type");
    assert_eq!(report["discovery"]["strategy"]["strategy"], "default_construction");
    assert_eq!(report["discovery"]["assigned"], true);

    // Root_Loaded is bound to the ready event and invoked once.
    let calls = report["calls"].as_array().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["method"], "Root_Loaded");
}

#[test]
fn test_wire_reports_deferred_when_nothing_is_found() {
    let dir = TempDir::new().unwrap();
    let yaml = DISCOVERY_SCENE.replace("MainPageViewModel", "ShellViewModel");
    let scene = write_scene(&dir, "nothing.yaml", &yaml);

    let report = wire_json(&[scene.to_str().unwrap()]);

    assert_eq!(report["discovery"], Json::Null);
    assert!(report["bindings"].as_array().unwrap().is_empty());
    let diagnostics = report["diagnostics"].as_array().unwrap();
    assert!(diagnostics
        .iter()
        .any(|d| d["severity"] == "warning" && d["message"].as_str().unwrap().contains("deferred")));
}

#[test]
fn test_wire_applies_explicit_bindings() {
    let dir = TempDir::new().unwrap();
    let yaml = BOUND_SCENE.replace(
        "    - { type: Controls.Button, name: Save, events: [Click] }\n",
        "    - type: Controls.Button\n      name: Save\n      events: [Click]\n      properties: [{ name: Content }]\n      bindings:\n        - { ui_member: Content, property_name: Title_Text, mode: one_time }\n",
    );
    let scene = write_scene(&dir, "explicit.yaml", &yaml);

    let report = wire_json(&[scene.to_str().unwrap()]);

    let bindings = report["bindings"].as_array().unwrap();
    assert_eq!(bindings.len(), 3);
    let explicit = bindings.iter().find(|b| b["ui_member"] == "Content").unwrap();
    assert_eq!(explicit["node"], "Save");
    assert_eq!(explicit["binding"]["kind"], "copy");
}

#[test]
fn test_wire_reports_failed_explicit_binding_and_keeps_convention_bindings() {
    let dir = TempDir::new().unwrap();
    let yaml = BOUND_SCENE.replace(
        "    - { type: Controls.Button, name: Save, events: [Click] }\n",
        "    - type: Controls.Button\n      name: Save\n      events: [Click]\n      bindings:\n        - { ui_member: Content, property_name: Title_Text }\n",
    );
    let scene = write_scene(&dir, "missing_member.yaml", &yaml);

    autowire_cmd()
        .arg("wire")
        .arg(&scene)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 binding(s)"))
        .stdout(predicate::str::contains("Title.Text <- Title_Text [sync (two-way)]"))
        .stdout(predicate::str::contains("Save.Click <- Save_Click [event]"))
        .stdout(predicate::str::contains("AW-022"));

    let report = wire_json(&[scene.to_str().unwrap()]);
    assert_eq!(report["bindings"].as_array().unwrap().len(), 2);
    let failed = report["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["severity"] == "error")
        .unwrap();
    assert_eq!(failed["node"], "Save");
    assert_eq!(failed["member"], "Content");
}

#[test]
fn test_wire_logs_at_warn_unless_overridden() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "main.yaml", BOUND_SCENE);

    autowire_cmd()
        .arg("wire")
        .arg(&scene)
        .assert()
        .success()
        .stderr(predicate::str::contains("wiring pass complete").not());

    autowire_cmd()
        .env("RUST_LOG", "info")
        .arg("wire")
        .arg(&scene)
        .arg("--json")
        .assert()
        .success()
        .stderr(predicate::str::contains("wiring pass complete"))
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_wire_rejects_malformed_event_reference() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "main.yaml", BOUND_SCENE);

    autowire_cmd()
        .arg("wire")
        .arg(&scene)
        .args(["--raise", "Click"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AW-032"))
        .stderr(predicate::str::contains("NodeName.EventName"));
}

#[test]
fn test_wire_rejects_unknown_node() {
    let dir = TempDir::new().unwrap();
    let scene = write_scene(&dir, "main.yaml", BOUND_SCENE);

    autowire_cmd()
        .arg("wire")
        .arg(&scene)
        .args(["--raise", "Cancel.Click"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AW-033"));
}
