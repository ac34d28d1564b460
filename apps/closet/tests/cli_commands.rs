//! Integration tests for the closet CLI.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use closet_core::framework::FrameworkCapability;
use closet_core::scene::{load_document, save_document};
use closet_core::{GeneratorSettings, LayoutId, Scene, SceneGraph, generated};
use predicates::prelude::*;
use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Command isolated from the user's config dirs and journal.
fn closet_cmd(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("closet");
    cmd.env("XDG_CONFIG_HOME", temp.path().join("xdg"))
        .env("CLOSET_JOURNAL_DIR", temp.path().join("journal"))
        .env_remove("CLOSET_FRAMEWORK")
        .env_remove("CLOSET_JOURNAL_DISABLED")
        .env_remove("RUST_LOG")
        .arg("--config-dir")
        .arg(temp.path());
    cmd
}

fn write_scene(temp: &TempDir, with_framework: bool) -> PathBuf {
    let mut scene = Scene::new();
    if with_framework {
        for capability in FrameworkCapability::REQUIRED {
            scene.register_type(capability.type_names(LayoutId::ModularAvatar.layout()).qualified);
        }
    }
    let avatar = scene.create_root("Avatar").unwrap();
    let closet = scene.create_node(avatar, "Closet").unwrap();
    scene.create_node(closet, "Coat").unwrap();
    scene.create_node(closet, "Hat").unwrap();

    let path = temp.path().join("scene.json");
    save_document(&scene, &path).unwrap();
    path
}

fn module_count(path: &Path) -> usize {
    let scene = load_document(path).unwrap();
    let avatar = scene.find_path("Avatar").unwrap();
    generated::module_candidates(&scene, avatar, &GeneratorSettings::default())
        .unwrap()
        .len()
}

fn scene_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
#[serial]
fn test_run_saves_generated_module() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);

    closet_cmd(&temp)
        .args(["run", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--outfit", "Coat=Closet/Coat", "--outfit", "Rain Hat=Closet/Hat@Heads"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline done"))
        .stdout(predicate::str::contains("apply.done"));

    assert_eq!(module_count(&scene), 1);
    let reloaded = load_document(&scene).unwrap();
    assert!(reloaded.find_path("Avatar/AvatarClosetModule").is_some());
}

#[test]
#[serial]
fn test_second_run_needs_no_repair() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);

    for _ in 0..2 {
        closet_cmd(&temp)
            .args(["run", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
            .args(["--closet", "Closet"])
            .assert()
            .success();
    }

    closet_cmd(&temp)
        .args(["run", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--closet", "Closet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No repair needed."));
    assert_eq!(module_count(&scene), 1);
}

#[test]
#[serial]
fn test_dry_run_leaves_scene_file_alone() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);
    let before = std::fs::read_to_string(&scene).unwrap();

    closet_cmd(&temp)
        .args(["run", "--dry-run", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--closet", "Closet"])
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&scene).unwrap(), before);
}

#[test]
#[serial]
fn test_run_json_output() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);

    let output = closet_cmd(&temp)
        .args(["run", "--json", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--closet", "Closet"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["applied"], true);
    assert_eq!(result["has_error"], false);
    assert!(result["messages"].as_array().is_some_and(|m| !m.is_empty()));
}

#[test]
#[serial]
fn test_validate_fails_without_framework() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, false);
    let before = std::fs::read_to_string(&scene).unwrap();

    closet_cmd(&temp)
        .args(["validate", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--closet", "Closet"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("framework.missing"))
        .stdout(predicate::str::contains("Validation failed"));

    assert_eq!(std::fs::read_to_string(&scene).unwrap(), before);
}

#[test]
#[serial]
fn test_validate_reports_pending_repair() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);

    closet_cmd(&temp)
        .args(["validate", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--closet", "Closet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation passed."));

    // A module without metadata is drift.
    let mut document = load_document(&scene).unwrap();
    let avatar = document.find_path("Avatar").unwrap();
    document.create_node(avatar, "AvatarClosetModule").unwrap();
    save_document(&document, &scene).unwrap();

    closet_cmd(&temp)
        .args(["validate", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--closet", "Closet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("drift.metadata_missing"))
        .stdout(predicate::str::contains("Validation passed; repair needed"));
}

#[test]
#[serial]
fn test_unknown_avatar_is_an_error() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);

    closet_cmd(&temp)
        .args(["validate", "--scene", scene_arg(&scene), "--avatar", "Nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Avatar 'Nobody' not found"));
}

#[test]
#[serial]
fn test_run_appends_journal_line() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);

    closet_cmd(&temp)
        .args(["run", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--closet", "Closet"])
        .assert()
        .success();

    let journal_dir = temp.path().join("journal");
    let files: Vec<_> = std::fs::read_dir(&journal_dir).unwrap().collect();
    assert_eq!(files.len(), 1);
    let path = files[0].as_ref().unwrap().path();
    let content = std::fs::read_to_string(path).unwrap();
    let line: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(line["command"], "run");
    assert_eq!(line["applied"], true);
}

#[test]
#[serial]
fn test_journal_can_be_disabled() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);

    closet_cmd(&temp)
        .env("CLOSET_JOURNAL_DISABLED", "1")
        .args(["run", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--closet", "Closet"])
        .assert()
        .success();

    assert!(!temp.path().join("journal").exists());
}

#[test]
#[serial]
fn test_inspect_and_forget() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);

    closet_cmd(&temp)
        .args(["run", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .args(["--outfit", "Coat=Closet/Coat"])
        .assert()
        .success();

    let output = closet_cmd(&temp)
        .args(["inspect", "--json", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["modules"].as_array().unwrap().len(), 1);
    assert_eq!(report["modules"][0]["wired"], true);
    assert_eq!(report["registration"]["healthy"], true);
    assert_eq!(report["registration"]["entries"][0]["name"], "Coat");

    closet_cmd(&temp)
        .args(["forget", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registration record removed"));

    let reloaded = load_document(&scene).unwrap();
    let avatar = reloaded.find_path("Avatar").unwrap();
    assert_eq!(generated::find_store(&reloaded, avatar).unwrap(), None);

    closet_cmd(&temp)
        .args(["forget", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No registration record found"));
}

#[test]
#[serial]
fn test_config_schema_outputs_valid_json() {
    let temp = TempDir::new().unwrap();
    let output = closet_cmd(&temp).args(["config", "schema"]).output().unwrap();
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(schema.get("properties").is_some());
}

#[test]
#[serial]
fn test_config_init_then_show() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("closet.json");

    closet_cmd(&temp)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));
    assert!(config_path.exists());

    closet_cmd(&temp)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    closet_cmd(&temp)
        .args(["config", "init", "--force"])
        .assert()
        .success();

    closet_cmd(&temp)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"generator\""))
        .stdout(predicate::str::contains("modular_avatar"));
}

#[test]
#[serial]
fn test_config_validate_reports_warnings() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("closet.json"),
        r#"{ "framework": { "layout": "made_up" } }"#,
    )
    .unwrap();

    closet_cmd(&temp)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("framework.layout.unknown"));
}

#[test]
#[serial]
fn test_unknown_layout_blocks_pipeline_commands() {
    let temp = TempDir::new().unwrap();
    let scene = write_scene(&temp, true);
    std::fs::write(
        temp.path().join("closet.json"),
        r#"{ "framework": { "layout": "made_up" } }"#,
    )
    .unwrap();

    closet_cmd(&temp)
        .args(["validate", "--scene", scene_arg(&scene), "--avatar", "Avatar"])
        .assert()
        .failure();
}
