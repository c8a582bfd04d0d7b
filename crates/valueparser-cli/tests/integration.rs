//! Integration tests for the valueparser CLI.

use std::io::Write;
use std::process::{Command, Output};

fn valueparser(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_valueparser"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help() {
    let output = valueparser(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Composable value parser pipelines"));
}

#[test]
fn test_list() {
    let output = valueparser(&["list"]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("Clipped"));
    assert!(out.contains("min: float = -inf"));
    assert!(out.contains("modulo: float (required)"));
}

#[test]
fn test_schema() {
    let output = valueparser(&["schema", "float,Clipped,Rounded"]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("[float, Clipped, Rounded]"));
    let fields: Vec<&str> = out
        .lines()
        .skip(1)
        .filter_map(|l| l.trim().split(':').next())
        .collect();
    assert_eq!(fields, vec!["min", "max", "ndigits"]);
}

#[test]
fn test_parse() {
    let output = valueparser(&[
        "parse", "float,Clipped", "--set", "min=0", "--set", "max=10", "11", "2.3", "-1",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output), "10.0\n2.3\n0.0\n");
}

#[test]
fn test_parse_error() {
    let output = valueparser(&["parse", "Bounded", "--set", "max=1", "5"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("5 is higher than 1"), "{stderr}");
    assert!(stderr.contains("out_of_bound"), "{stderr}");
}

#[test]
fn test_parse_unknown_parameter() {
    let output = valueparser(&["parse", "float", "--set", "bogus=1", "1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bogus"));
}

#[test]
fn test_run_document() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        r#"parsers:
  level:
    type: [int, Listed]
    items: [1, 2, 3]
    default_item: 1
"#
    )
    .unwrap();

    let path = file.path().to_string_lossy().into_owned();
    let output = valueparser(&["run", &path, "level", "\"3\"", "7"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output), "3\n1\n");

    let output = valueparser(&["run", &path, "missing", "1"]);
    assert!(!output.status.success());
}
