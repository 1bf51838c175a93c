use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn uispec(dir: &tempfile::TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_uispec"))
        .args(args)
        .current_dir(dir.path())
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn failed_compile_prints_only_the_envelope_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let spec = fixture("violations.yaml");
    let out = uispec(&dir, &["compile", "--spec", spec.to_str().unwrap(), "--planner", "derived"]);

    assert!(!out.status.success());
    let envelope: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(envelope["errors"].as_array().unwrap().len(), 4);
    assert!(String::from_utf8_lossy(&out.stderr).contains("Reading input from"));
}

#[test]
fn successful_compile_prints_only_the_id_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let spec = fixture("items.yaml");
    let output = dir.path().join("out");
    let out = uispec(
        &dir,
        &[
            "compile",
            "--spec",
            spec.to_str().unwrap(),
            "--planner",
            "derived",
            "--output",
            output.to_str().unwrap(),
        ],
    );

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let id = stdout.trim();
    assert_eq!(stdout.lines().count(), 1);
    assert_eq!(id.len(), 12);
    assert!(output.join(id).join("result.json").is_file());
    assert!(output.join(id).join("items.json").is_file());
}
