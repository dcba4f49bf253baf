//! CLI end-to-end tests against a stub ffmpeg binary.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

#[allow(deprecated)]
fn clipflow_cmd() -> Command {
    Command::cargo_bin("clipflow").unwrap()
}

/// Write an executable stub that logs nothing, answers probes with canned
/// diagnostics and otherwise creates the file named by its last argument.
fn write_stub(dir: &Path) -> PathBuf {
    let path = dir.join("ffmpeg-stub.sh");
    let body = r#"#!/bin/sh
if [ "$#" -eq 2 ]; then
    cat >&2 <<'EOF'
  Duration: 00:01:30.00, start: 0.000000, bitrate: 500 kb/s
    Stream #0:0: Video: h264 (High), yuv420p, 1280x720, 400 kb/s, 25 fps
    Stream #0:1: Audio: aac (LC), 44100 Hz, stereo, fltp, 96 kb/s
EOF
    exit 1
fi
for last in "$@"; do :; done
: > "$last"
exit 0
"#;
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Config file pointing the binary at the stub and the root at `store`.
fn write_config(dir: &Path, stub: &Path) -> PathBuf {
    let config_path = dir.join("clipflow.toml");
    let store = dir.join("store");
    let config = format!(
        "root = \"{}\"\n\n[av]\nbinary = \"{}\"\n",
        store.display(),
        stub.display()
    );
    fs::write(&config_path, config).unwrap();
    config_path
}

#[test]
fn no_args_shows_usage() {
    let mut cmd = clipflow_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag_lists_subcommands() {
    let mut cmd = clipflow_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clipflow"))
        .stdout(predicate::str::contains("concat"));
}

#[test]
fn version_subcommand_prints_version() {
    let mut cmd = clipflow_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("clipflow"));
}

#[test]
fn check_tools_reports_ffmpeg() {
    let mut cmd = clipflow_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"));
}

#[test]
fn validate_without_config_uses_defaults() {
    let mut cmd = clipflow_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"));
}

#[test]
fn validate_accepts_written_config() {
    let dir = tempdir().unwrap();
    let stub = write_stub(dir.path());
    let config = write_config(dir.path(), &stub);

    let mut cmd = clipflow_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn thumbnail_writes_output_through_stub() {
    let dir = tempdir().unwrap();
    let stub = write_stub(dir.path());
    let config = write_config(dir.path(), &stub);

    let input = dir.path().join("store/videos/in.mp4");
    fs::create_dir_all(input.parent().unwrap()).unwrap();
    fs::write(&input, b"x").unwrap();

    let mut cmd = clipflow_cmd();
    cmd.args(["--config"])
        .arg(&config)
        .args(["thumbnail", "videos/in.mp4", "videos/out.mp4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote videos/out.mp4"));

    assert!(dir.path().join("store/videos/out.mp4").exists());
}

#[test]
fn probe_json_contains_parsed_fields() {
    let dir = tempdir().unwrap();
    let stub = write_stub(dir.path());
    let config = write_config(dir.path(), &stub);

    let input = dir.path().join("store/videos/in.mp4");
    fs::create_dir_all(input.parent().unwrap()).unwrap();
    fs::write(&input, b"x").unwrap();

    let mut cmd = clipflow_cmd();
    cmd.args(["--config"])
        .arg(&config)
        .args(["probe", "videos/in.mp4", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"seconds\": 90"))
        .stdout(predicate::str::contains("1280x720"));
}

#[test]
fn missing_input_exits_with_code_101() {
    let dir = tempdir().unwrap();
    let stub = write_stub(dir.path());
    let config = write_config(dir.path(), &stub);

    let mut cmd = clipflow_cmd();
    cmd.args(["--config"])
        .arg(&config)
        .args(["probe", "videos/nope.mp4"])
        .assert()
        .failure()
        .code(101);
}
