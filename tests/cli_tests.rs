//! Drives the `unitgen` binary the way a user would.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn unitgen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_unitgen"))
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run unitgen")
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[test]
fn test_exec_prints_report_and_summary() {
    let module = fixture("sample.py");
    let cases = fixture("cases.txt");
    let output = unitgen(&["exec", module.to_str().unwrap(), cases.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", text(&output.stderr));
    let stdout = text(&output.stdout);
    assert!(stdout.starts_with("add(1, 2) = 3\n"), "{stdout}");
    assert!(stdout.contains("Error executing divide(1, 0): division by zero"), "{stdout}");
    assert!(text(&output.stderr).contains("6 passed, 3 failed, 2 skipped"));
}

#[test]
fn test_exec_fail_on_error_sets_exit_code() {
    let module = fixture("sample.py");
    let cases = fixture("cases.txt");
    let output = unitgen(&["exec", module.to_str().unwrap(), cases.to_str().unwrap(), "--fail-on-error"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_run_with_case_file_exports_cases_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let saved = dir.path().join("saved.txt");
    let report = dir.path().join("report.txt");
    let module = fixture("sample.py");
    let cases = fixture("cases.txt");

    let output = unitgen(&[
        "run",
        module.to_str().unwrap(),
        "--cases",
        cases.to_str().unwrap(),
        "--save-cases",
        saved.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", text(&output.stderr));

    assert_eq!(fs::read_to_string(&saved).unwrap(), fs::read_to_string(&cases).unwrap());
    let report = fs::read_to_string(&report).unwrap();
    assert_eq!(report.lines().count(), 9);
    assert!(report.contains("greet('Ada') = Hello, Ada\n"));
}

#[test]
fn test_step_limit_flag() {
    let dir = tempfile::tempdir().unwrap();
    let cases = dir.path().join("cases.txt");
    fs::write(&cases, "spin()\n").unwrap();
    let module = fixture("sample.py");

    let output = unitgen(&["exec", module.to_str().unwrap(), cases.to_str().unwrap(), "--max-steps", "1000"]);
    assert!(output.status.success());
    assert_eq!(
        text(&output.stdout),
        "Error executing spin(): TimeoutError: execution exceeded 1000 steps\n"
    );
}

#[test]
fn test_broken_module_is_reported() {
    let module = fixture("broken.py");
    let cases = fixture("cases.txt");
    let output = unitgen(&["exec", module.to_str().unwrap(), cases.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(text(&output.stderr).contains("broken.py"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_generate_without_api_key() {
    let module = fixture("sample.py");
    let output = unitgen(&["generate", module.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(text(&output.stderr).contains("set OPENAI_API_KEY"));
}

#[test]
fn test_cases_command_lists_invocations() {
    let cases = fixture("cases.txt");
    let output = unitgen(&["cases", cases.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = text(&output.stdout);
    assert_eq!(stdout.lines().count(), 9);
    assert!(stdout.contains("hypotenuse(3, 4)\n"));
    assert!(text(&output.stderr).contains("9 case(s) parsed, 2 line(s) skipped"));
}

#[test]
fn test_version_flag() {
    let output = unitgen(&["--version"]);
    assert!(output.status.success());
    assert!(text(&output.stdout).starts_with("unitgen "));
}
