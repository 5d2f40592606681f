//! Integration tests for the `anteml` binary.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn anteml_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_anteml"))
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn run(args: &[&str]) -> Output {
    Command::new(anteml_bin())
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run anteml")
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(anteml_bin())
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn anteml");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().expect("failed to wait for anteml")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn render_file_verbatim() {
    let output = run(&["render", &fixture("hello.aml"), "--keep-whitespace"]);
    assert!(output.status.success(), "anteml render should succeed");
    assert_eq!(
        stdout(&output),
        "\n\x1b[32mHello \x1b[22m\x1b[1mWorld\x1b[22m\x1b[39m\n"
    );
}

#[test]
fn render_in_small_chunks_matches_whole() {
    let whole = run(&["render", &fixture("hello.aml"), "--keep-whitespace"]);
    for size in ["1", "3", "7"] {
        let chunked = run(&[
            "render",
            &fixture("hello.aml"),
            "--keep-whitespace",
            "--chunk-size",
            size,
        ]);
        assert!(chunked.status.success());
        assert_eq!(stdout(&chunked), stdout(&whole), "chunk size {size}");
    }
}

#[test]
fn render_in_chunks_with_default_whitespace_stripping() {
    let whole = run(&["render", &fixture("hello.aml")]);
    assert!(whole.status.success());
    assert_eq!(
        stdout(&whole),
        "\x1b[32mHello \x1b[22m\x1b[1mWorld\x1b[22m\x1b[39m"
    );
    for size in ["1", "2", "4", "21"] {
        let chunked = run(&["render", &fixture("hello.aml"), "--chunk-size", size]);
        assert!(chunked.status.success());
        assert_eq!(stdout(&chunked), stdout(&whole), "chunk size {size}");
    }
}

#[test]
fn render_reads_stdin() {
    let output = run_with_stdin(&["render"], "<fg red>x</fg>");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "\x1b[31mx\x1b[39m");

    let output = run_with_stdin(&["render", "-"], "<u>y</u>");
    assert_eq!(stdout(&output), "\x1b[4my\x1b[24m");
}

#[test]
fn render_unknown_tags_pass_through_unless_stripped() {
    let kept = run(&["render", &fixture("unknown.aml"), "--keep-whitespace"]);
    assert_eq!(stdout(&kept), "<span>a</span>\n");

    let stripped = run(&[
        "render",
        &fixture("unknown.aml"),
        "--keep-whitespace",
        "--strip-unknown",
    ]);
    assert_eq!(stdout(&stripped), "a\n");
}

#[test]
fn render_uses_config_file() {
    let output = run(&[
        "render",
        &fixture("unknown.aml"),
        "--keep-whitespace",
        "--config",
        &fixture("strict.json"),
    ]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "a\n");

    let output = run_with_stdin(
        &["render", "--config", &fixture("strict.json")],
        "<bold>x</bold>",
    );
    assert_eq!(stdout(&output), "\x1b[22m\x1b[1mx\x1b[22m");
}

#[test]
fn render_invalid_markup_fails_after_partial_output() {
    let output = run(&["render", &fixture("invalid.aml"), "--keep-whitespace"]);
    assert!(!output.status.success());
    assert_eq!(stdout(&output), "ok ");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid markup"), "stderr: {stderr}");
}

#[test]
fn check_reports_each_file() {
    let output = run(&["check", &fixture("hello.aml"), &fixture("invalid.aml")]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("hello.aml: "));
    assert!(out.contains("OK"));
    assert!(out.contains("<fg> tag"), "stdout: {out}");
}

#[test]
fn check_quiet_prints_only_failures() {
    let output = run(&["check", "--quiet", &fixture("hello.aml")]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
}

#[test]
fn missing_file_is_an_error() {
    let output = run(&["render", &fixture("nope.aml")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read"), "stderr: {stderr}");
}
