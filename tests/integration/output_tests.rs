use clap::Parser;
use hashdupe::cli::Cli;
use hashdupe::error::ExitCode;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn fixture(root: &Path) {
    fs::write(root.join("a.txt"), b"hello").unwrap();
    fs::write(root.join("b.txt"), b"hello").unwrap();
    fs::write(root.join("c.txt"), b"world").unwrap();
    fs::write(root.join("empty"), b"").unwrap();
}

fn run(root: &Path, format: &str) -> (ExitCode, String) {
    let cli = Cli::try_parse_from([
        "hashdupe",
        "-q",
        "scan",
        root.to_str().unwrap(),
        "--output",
        format,
        "--no-progress",
    ])
    .unwrap();

    let mut out = Vec::new();
    let code = hashdupe::run_app_with_output(cli, &mut out, false).unwrap();
    (code, String::from_utf8(out).unwrap())
}

#[test]
fn test_json_report() {
    let dir = tempdir().unwrap();
    fixture(dir.path());

    let (code, out) = run(dir.path(), "json");
    assert_eq!(code, ExitCode::Success);

    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let groups = value["duplicates"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups[0]["original"].as_str().unwrap().ends_with("a.txt"));
    assert!(groups[0]["duplicates"][0]
        .as_str()
        .unwrap()
        .ends_with("b.txt"));
    assert_eq!(groups[0]["fingerprint"].as_str().unwrap().len(), 32);

    let summary = &value["summary"];
    assert_eq!(summary["total_files"], 4);
    assert_eq!(summary["empty_files"], 1);
    assert_eq!(summary["total_bytes"], 15);
    assert_eq!(summary["reclaimable_bytes"], 5);
    assert_eq!(summary["exit_code_name"], "HD000");
}

#[test]
fn test_csv_report() {
    let dir = tempdir().unwrap();
    fixture(dir.path());

    let (code, out) = run(dir.path(), "csv");
    assert_eq!(code, ExitCode::Success);

    let mut reader = csv::Reader::from_reader(out.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["group_id", "fingerprint", "original", "duplicate", "size"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "1");
    assert!(rows[0][2].ends_with("a.txt"));
    assert!(rows[0][3].ends_with("b.txt"));
    assert_eq!(&rows[0][4], "5");
}

#[test]
fn test_text_report() {
    let dir = tempdir().unwrap();
    fixture(dir.path());

    let (code, out) = run(dir.path(), "text");
    assert_eq!(code, ExitCode::Success);

    let first = out.lines().next().unwrap();
    assert!(first.contains("b.txt"));
    assert!(first.contains("a.txt"));
    assert!(!first.contains('\u{1b}'), "colors must be off when not interactive");
    assert!(out.contains("Scanned 4 files"));
    assert!(out.contains("Found 1 duplicates in 1 groups"));
}

#[test]
fn test_no_duplicates_report() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only"), b"one of a kind").unwrap();

    let (code, out) = run(dir.path(), "text");
    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(out.contains("No duplicates found"));
}
