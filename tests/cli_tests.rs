//! CLI integration tests for the `assetflow` binary.
//!
//! Runs `config`, `plan` and `finish` against temporary project trees and
//! checks output and exit codes.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run assetflow in `dir` with the given arguments and return (stdout, stderr, exit code).
fn run_assetflow(dir: &Path, args: &[&str]) -> (String, String, Option<i32>) {
    let output = Command::new(env!("CARGO_BIN_EXE_assetflow"))
        .args(args)
        .current_dir(dir)
        .env_remove("NODE_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute assetflow");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code())
}

fn write_file(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap().write_all(content.as_bytes()).unwrap();
}

fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "assetflow.toml", "[entries]\nindex = [\"src/index.js\"]\n");
    write_file(temp.path(), "package.json", r#"{"name": "starter-kit"}"#);
    write_file(temp.path(), "src/index.js", "");
    write_file(temp.path(), "src/app.scss", "");
    write_file(temp.path(), "src/index.html", "");
    temp
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_development_default() {
    let project = create_project();
    let (stdout, _, code) = run_assetflow(project.path(), &["config"]);
    assert_eq!(code, Some(0));

    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["mode"], "development");
    assert_eq!(json["entry"]["index"][0], "src/index.js");
    assert_eq!(json["devtool"], "source-map");
    assert!(json["stages"].as_array().unwrap().iter().all(|s| s["stage"] != "compress"));
}

#[test]
fn test_config_production_flag() {
    let project = create_project();
    let (stdout, _, code) = run_assetflow(project.path(), &["config", "--mode", "production", "--compact"]);
    assert_eq!(code, Some(0));
    assert_eq!(stdout.trim().lines().count(), 1, "compact output is a single line");

    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["mode"], "production");
    assert_eq!(json["stages"][0]["stage"], "compress");
    assert_eq!(json["optimization"]["minimize"], true);
}

#[test]
fn test_config_mode_from_env() {
    let project = create_project();
    let output = Command::new(env!("CARGO_BIN_EXE_assetflow"))
        .arg("config")
        .current_dir(project.path())
        .env("NODE_ENV", "production")
        .output()
        .expect("Failed to execute assetflow");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["mode"], "production");
}

#[test]
fn test_config_out_override() {
    let project = create_project();
    let (stdout, _, code) = run_assetflow(project.path(), &["config", "--out", "public"]);
    assert_eq!(code, Some(0));
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let out = json["output"]["path"].as_str().unwrap();
    assert!(out.ends_with("public"), "unexpected output path {}", out);
}

#[test]
fn test_config_invalid_mode() {
    let project = create_project();
    let (_, _, code) = run_assetflow(project.path(), &["config", "--mode", "staging"]);
    assert_eq!(code, Some(2));
}

#[test]
fn test_config_missing_config_file() {
    let project = create_project();
    let (_, stderr, code) = run_assetflow(project.path(), &["config", "--config", "nope.toml"]);
    assert_eq!(code, Some(2));
    assert!(stderr.contains("config file not found"));
}

#[test]
fn test_config_missing_manifest() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "assetflow.toml", "");
    let (stdout, stderr, code) = run_assetflow(temp.path(), &["config"]);
    assert_eq!(code, Some(1));
    assert!(stdout.is_empty(), "no partial configuration is emitted");
    assert!(stderr.contains("package.json"));
}

#[test]
fn test_config_unmatched_source_emits_nothing() {
    let project = create_project();
    write_file(
        project.path(),
        "assetflow.toml",
        "[entries]\nindex = [\"src/index.js\"]\n[styles]\ntest = '\\.css$'\n",
    );
    let (stdout, stderr, code) = run_assetflow(project.path(), &["config"]);
    assert_eq!(code, Some(1));
    assert!(stdout.is_empty(), "no configuration is handed off");
    assert!(stderr.contains("src/app.scss"));
}

// ============================================================================
// plan
// ============================================================================

#[test]
fn test_plan_summary() {
    let project = create_project();
    let (stdout, _, code) = run_assetflow(project.path(), &["plan"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("src/index.js [script] scripts"));
    assert!(stdout.contains("src/app.scss [style] styles"));
    assert!(stdout.contains("3 sources: 3 claimed, 0 pass-through"));
}

#[test]
fn test_plan_src_override() {
    let project = create_project();
    write_file(project.path(), "assets/theme.scss", "");
    let (stdout, _, code) = run_assetflow(project.path(), &["plan", "--src", "assets"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("assets/theme.scss [style] styles"));
    assert!(!stdout.contains("src/index.js"));
    assert!(stdout.contains("1 sources: 1 claimed, 0 pass-through"));
}

#[test]
fn test_plan_json() {
    let project = create_project();
    let (stdout, _, code) = run_assetflow(project.path(), &["plan", "--json"]);
    assert_eq!(code, Some(0));
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[test]
fn test_plan_unmatched_style_fails() {
    let project = create_project();
    write_file(
        project.path(),
        "assetflow.toml",
        "[entries]\nindex = [\"src/index.js\"]\n[styles]\ntest = '\\.css$'\n",
    );
    let (stdout, stderr, code) = run_assetflow(project.path(), &["plan"]);
    assert_eq!(code, Some(1));
    assert!(stdout.is_empty());
    assert!(stderr.contains("src/app.scss"));
}

// ============================================================================
// finish
// ============================================================================

#[test]
fn test_finish_without_host() {
    let project = create_project();
    let (stdout, _, code) = run_assetflow(project.path(), &["finish"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("2 succeeded, 0 degraded"));
}

#[test]
fn test_finish_required_failure() {
    let project = create_project();
    write_file(
        project.path(),
        "assetflow.toml",
        "[entries]\nindex = [\"src/index.js\"]\n\n[collaborators.translations]\nenabled = false\n\n\
         [collaborators.sync]\nhost = \"localhost\"\nprogram = \"assetflow-missing-sync-program\"\n",
    );
    let (_, stderr, code) = run_assetflow(project.path(), &["finish"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("collaborator 'remote-sync' failed"));
}

#[test]
fn test_finish_unmatched_source_skips_collaborators() {
    let project = create_project();
    write_file(
        project.path(),
        "assetflow.toml",
        "[entries]\nindex = [\"src/index.js\"]\n[styles]\ntest = '\\.css$'\n\n\
         [collaborators.sync]\nhost = \"localhost\"\nprogram = \"assetflow-missing-sync-program\"\n",
    );
    let (stdout, stderr, code) = run_assetflow(project.path(), &["finish"]);
    assert_eq!(code, Some(1));
    assert!(stdout.is_empty());
    assert!(stderr.contains("src/app.scss"));
    assert!(!stderr.contains("remote-sync"));
}
