use std::process::Command;

fn run(fixture: &str) -> (String, String, bool) {
    let path = format!("tests/fixtures/{fixture}");
    let output = Command::new(env!("CARGO_BIN_EXE_plastic-market"))
        .arg(&path)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn full_lifecycle() {
    let (stdout, stderr, success) = run("lifecycle.csv");

    assert!(success);
    assert!(stderr.is_empty(), "unexpected warnings: {stderr}");

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "tx,company,picker,weight,price,state");
    assert_eq!(lines[1], "0,10,20,150,10,settled");
    assert_eq!(lines[2], "1,11,21,60,4,settled");
    // deposited after the price change
    assert_eq!(lines[3], "2,10,20,200,25,pending");
    assert_eq!(lines.len(), 4);
}

#[test]
fn rejected_calls_warn_but_do_not_block() {
    let (stdout, stderr, success) = run("with_errors.csv");

    assert!(success);
    assert!(stderr.contains("already registered"));
    assert!(stderr.contains("below the company minimum"));
    assert!(stderr.contains("unrecognized operation"));
    assert!(stderr.contains("missing argument"));
    assert!(stderr.contains("not a registered company"));
    assert!(stderr.contains("allowance"));
    assert!(stderr.contains("expected approved"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "tx,company,picker,weight,price,state");
    assert_eq!(lines[1], "0,10,20,150,10,settled");
    assert_eq!(lines.len(), 2);
}

#[test]
fn missing_argument_prints_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_plastic-market"))
        .output()
        .expect("failed to run binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("usage"));
}
