// Reproducibility tests.
//
// Identical inputs must produce byte-identical reports, both through the
// library API and through the CLI binary, including fingerprints.

use std::path::{Path, PathBuf};
use std::process::Command;

use adrift::driver::{self, CheckOptions};

fn adrift_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_adrift"))
}

fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

/// Run the CLI; findings are expected, so exit code 0 or 1 both pass.
fn run_adrift(args: &[&str]) -> String {
    let output = Command::new(adrift_binary())
        .args(args)
        .output()
        .expect("failed to run adrift");
    let code = output.status.code();
    assert!(
        matches!(code, Some(0) | Some(1)),
        "adrift failed with args {:?} (code {:?})\nstderr: {}",
        args,
        code,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("non-UTF8 output")
}

#[test]
fn library_findings_identical_across_runs() {
    let path = project_root().join("samples/notify.sk");
    let source = std::fs::read_to_string(&path).expect("failed to read notify.sk");

    let first = driver::check_source(&source, &CheckOptions::default());
    let second = driver::check_source(&source, &CheckOptions::default());

    assert_eq!(first.findings, second.findings);
    let fp_first: Vec<String> = first.findings.iter().map(adrift::baseline::fingerprint).collect();
    let fp_second: Vec<String> = second.findings.iter().map(adrift::baseline::fingerprint).collect();
    assert_eq!(fp_first, fp_second);
}

#[test]
fn cli_text_output_identical_across_runs() {
    let sk = project_root().join("samples/notify.sk");
    let sk_str = sk.to_str().unwrap();

    let first = run_adrift(&[sk_str]);
    let second = run_adrift(&[sk_str]);

    assert!(!first.is_empty(), "expected findings in notify.sk");
    assert_eq!(
        first, second,
        "text output should be byte-identical across runs"
    );
}

#[test]
fn cli_json_output_identical_across_runs() {
    let sk = project_root().join("samples/notify.sk");
    let sk_str = sk.to_str().unwrap();

    let first = run_adrift(&["--format", "json", sk_str]);
    let second = run_adrift(&["--format", "json", sk_str]);

    assert_eq!(
        first, second,
        "JSON output should be byte-identical across runs"
    );
}

#[test]
fn cli_clean_sample_exits_zero_with_no_output() {
    let sk = project_root().join("samples/clean.sk");
    let output = Command::new(adrift_binary())
        .arg(sk.to_str().unwrap())
        .output()
        .expect("failed to run adrift");
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn cli_baseline_round_trip_suppresses_findings() {
    let sk = project_root().join("samples/notify.sk");
    let sk_str = sk.to_str().unwrap();
    let baseline_path = std::env::temp_dir().join(format!(
        "adrift_repro_baseline_{}.json",
        std::process::id()
    ));
    let baseline_str = baseline_path.to_str().unwrap();

    // Record the current findings...
    let write = Command::new(adrift_binary())
        .args(["--baseline", baseline_str, "--write-baseline", sk_str])
        .output()
        .expect("failed to run adrift");
    assert_eq!(write.status.code(), Some(0));

    // ...then a rerun against the baseline reports nothing.
    let rerun = Command::new(adrift_binary())
        .args(["--baseline", baseline_str, sk_str])
        .output()
        .expect("failed to run adrift");
    let _ = std::fs::remove_file(&baseline_path);
    assert_eq!(rerun.status.code(), Some(0));
    assert!(rerun.stdout.is_empty());
}
