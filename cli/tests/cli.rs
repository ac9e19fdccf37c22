use std::fs;
use std::process::{Command, Output};

use tempfile::tempdir;

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_builtup"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn fetch_skips_existing_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("buildings.geojson");
    fs::write(&output, "{}").unwrap();

    let result = run_cli(&[
        "fetch",
        "--bbox", "-78.9382,35.9940,-78.9005,36.0402",
        "-o", output.to_str().unwrap(),
        "--command", "command-that-does-not-exist",
    ]);
    assert!(result.status.success());
    assert_eq!(fs::read_to_string(&output).unwrap(), "{}");
}

#[test]
fn fetch_rejects_malformed_bbox() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("buildings.geojson");

    let result = run_cli(&["fetch", "--bbox", "1,2,3", "-o", output.to_str().unwrap()]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("bbox"));
}

#[test]
fn grid_fails_on_missing_inputs() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.geojson");
    let raster = dir.path().join("missing.tif");
    let output = dir.path().join("grid.geojson");

    let result = run_cli(&[
        "grid",
        missing.to_str().unwrap(),
        raster.to_str().unwrap(),
        "-o", output.to_str().unwrap(),
    ]);
    assert!(!result.status.success());
    assert!(!output.exists());
}
