mod common;

use std::path::PathBuf;

use clap::Parser;
use stepgraph::cli::CliArgs;
use stepgraph::run;

use crate::common::temp_file;

fn demo() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos/Pipeline.toml")
        .display()
        .to_string()
}

fn run_with(args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["stepgraph"];
    argv.extend_from_slice(args);
    run(CliArgs::try_parse_from(argv)?)
}

#[test]
fn test_validate_accepts_demo() {
    run_with(&["--config", &demo(), "validate"]).unwrap();
}

#[test]
fn test_validate_fails_on_violations() {
    let file = temp_file(
        ".toml",
        r#"
[pipeline]
name = "p"

[[steps]]
name = "A"
type = "processing"
[steps.arguments]
x = { Get = "Steps.B.out" }
"#,
    );
    let path = file.path().display().to_string();
    let err = run_with(&["--config", &path, "validate"]).unwrap_err();
    assert!(err.to_string().contains("1 violation(s)"), "{err}");
}

#[test]
fn test_render_writes_definition_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("demo-ml-pipeline.definition.json");
    let out_str = out.display().to_string();

    run_with(&["--config", &demo(), "render", "--out", &out_str, "--compact"]).unwrap();

    let body = std::fs::read_to_string(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["Steps"].as_array().unwrap().len(), 3);

    // The rendered file is itself a loadable pipeline.
    run_with(&["--config", &out_str, "deps"]).unwrap();
}

#[test]
fn test_dry_run_checks_param_overrides() {
    run_with(&["--config", &demo(), "dry-run", "--param", "TrainingEpochs=20"]).unwrap();

    assert!(run_with(&["--config", &demo(), "dry-run", "--param", "TrainingEpochs=many"]).is_err());
    assert!(run_with(&["--config", &demo(), "dry-run", "--param", "Nope=1"]).is_err());
}

#[test]
fn test_seed_command_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().display().to_string();

    run_with(&["seed", "--root", &root, "--bucket", "b", "--rows", "3"]).unwrap();

    let csv = std::fs::read_to_string(dir.path().join("b/raw/data.csv")).unwrap();
    assert_eq!(csv.lines().count(), 4);
}
