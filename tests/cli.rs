//! CLI integration tests.
//!
//! Each test runs the findmerge binary against temp-directory inputs; the
//! interactive path is covered by the engine tests, so everything here uses
//! --non-interactive.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn findmerge_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_findmerge"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to execute findmerge")
}

fn findmerge_ok(dir: &Path, args: &[&str]) -> String {
    let out = findmerge_in(dir, args);
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "findmerge {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.to_string()
}

fn findmerge_fails(dir: &Path, args: &[&str]) -> String {
    let out = findmerge_in(dir, args);
    assert!(
        !out.status.success(),
        "expected findmerge {} to fail, but it succeeded.\nstdout: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
    );
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn write_input(dir: &Path, name: &str, findings: &serde_json::Value) {
    std::fs::write(dir.join(name), serde_json::to_string_pretty(findings).unwrap()).unwrap();
}

fn read_output(dir: &Path, name: &str) -> Vec<serde_json::Value> {
    let contents = std::fs::read_to_string(dir.join(name)).unwrap();
    serde_json::from_str::<serde_json::Value>(&contents)
        .unwrap()
        .as_array()
        .cloned()
        .unwrap()
}

fn sample_inputs() -> (serde_json::Value, serde_json::Value) {
    let left = serde_json::json!([
        {
            "id": 4,
            "severity": "High",
            "cvss_score": 7.5,
            "finding_type": "Web Application",
            "title": "SQL Injection",
            "description": "input reaches a query unsanitised",
            "impact": "data exposure",
            "mitigation": "parameterise queries",
            "tags": ["SQLi"],
            "extra_fields": {}
        },
        {
            "id": 5,
            "severity": "Low",
            "finding_type": "Network",
            "title": "Verbose Banner",
            "description": "service reveals its version",
            "impact": "reconnaissance aid",
            "mitigation": "strip the banner",
            "tags": [],
            "extra_fields": {}
        }
    ]);
    let right = serde_json::json!([
        {
            "id": 9,
            "severity": "High",
            "cvss_score": "7.5",
            "finding_type": "Web Application",
            "title": "Sql injection vulnerability",
            "description": "input reaches a query unsanitised",
            "impact": "data exposure",
            "mitigation": "parameterise queries",
            "tags": ["injection"],
            "extra_fields": {}
        }
    ]);
    (left, right)
}

#[test]
fn non_interactive_run_writes_aligned_outputs() {
    let dir = TempDir::new().unwrap();
    let (left, right) = sample_inputs();
    write_input(dir.path(), "a.json", &left);
    write_input(dir.path(), "b.json", &right);

    let stdout = findmerge_ok(
        dir.path(),
        &[
            "--left",
            "a.json",
            "--right",
            "b.json",
            "--out-left",
            "a.out.json",
            "--out-right",
            "b.out.json",
            "--non-interactive",
        ],
    );
    assert!(stdout.contains("Reconciled 2 finding(s)"), "stdout: {stdout}");

    let out_a = read_output(dir.path(), "a.out.json");
    let out_b = read_output(dir.path(), "b.out.json");
    assert_eq!(out_a.len(), 2);
    assert_eq!(out_b.len(), 2);
    for (a, b) in out_a.iter().zip(&out_b) {
        assert_eq!(a["id"], b["id"]);
    }
    assert_eq!(out_a[0]["id"], serde_json::json!(1));
    // Tag union from both sides of the matched pair.
    assert_eq!(out_a[0]["tags"], serde_json::json!(["injection", "sqli"]));
    // The string "7.5" on the right coerced to a number.
    assert_eq!(out_b[0]["cvss_score"], serde_json::json!(7.5));
}

#[test]
fn default_output_paths_append_merged_suffix() {
    let dir = TempDir::new().unwrap();
    let (left, right) = sample_inputs();
    write_input(dir.path(), "a.json", &left);
    write_input(dir.path(), "b.json", &right);

    findmerge_ok(
        dir.path(),
        &["--left", "a.json", "--right", "b.json", "--non-interactive"],
    );

    assert!(dir.path().join("a.json.merged.json").exists());
    assert!(dir.path().join("b.json.merged.json").exists());
}

#[test]
fn config_file_controls_renumbering() {
    let dir = TempDir::new().unwrap();
    let (left, right) = sample_inputs();
    write_input(dir.path(), "a.json", &left);
    write_input(dir.path(), "b.json", &right);
    std::fs::write(
        dir.path().join("findmerge.toml"),
        "[renumber]\nstart_id = 100\n",
    )
    .unwrap();

    findmerge_ok(
        dir.path(),
        &[
            "--left",
            "a.json",
            "--right",
            "b.json",
            "--out-left",
            "a.out.json",
            "--out-right",
            "b.out.json",
            "--non-interactive",
        ],
    );

    let out_a = read_output(dir.path(), "a.out.json");
    assert_eq!(out_a[0]["id"], serde_json::json!(100));
    assert_eq!(out_a[1]["id"], serde_json::json!(101));
}

#[test]
fn missing_input_file_fails() {
    let dir = TempDir::new().unwrap();
    let stderr = findmerge_fails(
        dir.path(),
        &["--left", "missing.json", "--right", "also-missing.json"],
    );
    assert!(stderr.contains("missing.json"), "stderr: {stderr}");
}

#[test]
fn non_array_input_fails_with_shape_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.json"), "{\"not\": \"an array\"}").unwrap();
    std::fs::write(dir.path().join("b.json"), "[]").unwrap();

    let stderr = findmerge_fails(
        dir.path(),
        &["--left", "a.json", "--right", "b.json", "--non-interactive"],
    );
    assert!(stderr.contains("array"), "stderr: {stderr}");
}

#[test]
fn invalid_config_fails_before_reading_inputs() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("findmerge.toml"),
        "[match]\nthresholds = [70.0, 85.0]\n",
    )
    .unwrap();

    let stderr = findmerge_fails(
        dir.path(),
        &["--left", "a.json", "--right", "b.json", "--non-interactive"],
    );
    assert!(stderr.contains("descending"), "stderr: {stderr}");
}
