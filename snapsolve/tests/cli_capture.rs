//! CLI tests for `snapsolve capture` and `snapsolve solve` exit codes.
//!
//! The remote server URL points at a closed local port, so nothing leaves
//! the machine.

use std::fs;
use std::process::Command;

use snapsolve::exit_codes;
use snapsolve::test_support::JPEG_BYTES;

const CLOSED_SERVER: &str = "http://127.0.0.1:9";

fn snapsolve(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_snapsolve"));
    cmd.current_dir(dir).env_remove("SNAPSOLVE_CONFIG");
    cmd
}

#[test]
fn empty_frame_is_a_silent_no_op() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("blank.jpg"), b"").expect("write");

    let output = snapsolve(temp.path())
        .args(["capture", "--image", "blank.jpg", "--server", CLOSED_SERVER])
        .output()
        .expect("snapsolve capture");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_image_is_a_capture_failure() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = snapsolve(temp.path())
        .args(["capture", "--image", "nope.jpg", "--server", CLOSED_SERVER])
        .output()
        .expect("snapsolve capture");

    assert_eq!(output.status.code(), Some(exit_codes::CAPTURE_FAILED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("capture failed"));
}

#[test]
fn unreachable_server_is_a_service_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("photo.jpg"), JPEG_BYTES).expect("write");

    let output = snapsolve(temp.path())
        .args(["capture", "--image", "photo.jpg", "--server", CLOSED_SERVER])
        .output()
        .expect("snapsolve capture");

    assert_eq!(output.status.code(), Some(exit_codes::SERVICE_FAILED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("solve failed"));
}

#[test]
fn in_process_solve_needs_api_key() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("photo.jpg"), JPEG_BYTES).expect("write");
    fs::write(
        temp.path().join("snapsolve.toml"),
        "[model]\napi_key_env = \"SNAPSOLVE_TEST_MISSING_KEY\"\n",
    )
    .expect("write config");

    let output = snapsolve(temp.path())
        .env_remove("SNAPSOLVE_TEST_MISSING_KEY")
        .args(["solve", "photo.jpg"])
        .output()
        .expect("snapsolve solve");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("SNAPSOLVE_TEST_MISSING_KEY"));
}

#[test]
fn invalid_config_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("custom.toml"), "[capture]\ntimeout_secs = 0\n").expect("write");

    let output = snapsolve(temp.path())
        .args(["--config", "custom.toml", "capture", "--server", CLOSED_SERVER])
        .output()
        .expect("snapsolve capture");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("capture.timeout_secs"));
}
