//! CLI tests for `snapsolve replay` and `snapsolve prompt`.
//!
//! Spawns the binary against saved model responses; no network involved.

use std::fs;
use std::process::Command;

use snapsolve::exit_codes;
use snapsolve::io::submit::SubmitResponse;
use snapsolve::test_support::LINEAR_SOLUTION;

fn snapsolve(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_snapsolve"));
    cmd.current_dir(dir).env_remove("SNAPSOLVE_CONFIG");
    cmd
}

#[test]
fn replay_prints_numbered_steps() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("response.json"), LINEAR_SOLUTION).expect("write");

    let output = snapsolve(temp.path())
        .args(["replay", "response.json"])
        .output()
        .expect("snapsolve replay");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "1. Solve for x when $$4x - 2 = 2$$\n\
         2. Add 2 to both sides: $$4x = 4$$\n\
         3. Divide by 4: $$x = 1$$\n"
    );
}

#[test]
fn replay_json_matches_wire_shape() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("response.json"), LINEAR_SOLUTION).expect("write");

    let output = snapsolve(temp.path())
        .args(["replay", "--json", "response.json"])
        .output()
        .expect("snapsolve replay");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let response: SubmitResponse = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(response.steps.len(), 3);
    assert_eq!(response.steps[0], ["Solve for x when ", "4x - 2 = 2", ""]);
    assert!(response.step_errors.is_empty());
}

#[test]
fn replay_rejects_output_outside_schema() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("response.json"),
        r#"{"steps":[{"desc":"missing code"}]}"#,
    )
    .expect("write");

    let output = snapsolve(temp.path())
        .args(["replay", "response.json"])
        .output()
        .expect("snapsolve replay");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("schema validation failed"));
}

#[test]
fn replay_reports_failed_steps_and_keeps_going() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("response.json"),
        r#"{"steps":[
            {"desc":"$$~~a~~$$","code":"d['a'] = 5"},
            {"desc":"$$~~a~~ / 0$$","code":"d['q'] = d['a'] / 0"},
            {"desc":"$$~~r~~$$","code":"d['r'] = d['a'] * 2"}
        ]}"#,
    )
    .expect("write");

    let output = snapsolve(temp.path())
        .args(["replay", "response.json"])
        .output()
        .expect("snapsolve replay");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2. $$5 / 0$$\n   (values not updated:"));
    assert!(stdout.contains("3. $$10$$"));
}

#[test]
fn prompt_prints_contract() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = snapsolve(temp.path())
        .arg("prompt")
        .output()
        .expect("snapsolve prompt");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("$$"));
    assert!(stdout.contains("~~"));
    assert!(stdout.contains("4x - 2 = 2"));
}
