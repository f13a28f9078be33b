use std::fs;

use clap::Parser;
use spectree_cli::{run, Cli, CliError};

const SCAN: &str = "\
#S 1 ascan th 0 1 1 0.1
#L th  det
0 10
1 12
@A 1 2 3
@A 4 5 6
";

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("spectree").chain(args.iter().copied())).unwrap()
}

#[test]
fn convert_then_list() {
    let dir = tempfile::tempdir().unwrap();
    let spec = dir.path().join("scan.dat");
    let out = dir.path().join("scan.h5");
    fs::write(&spec, SCAN).unwrap();
    let spec = spec.to_str().unwrap();
    let out = out.to_str().unwrap();

    let summary = run(&cli(&["convert", spec, out, "--dataset-option", "compression=gzip"])).unwrap();
    assert!(summary.contains("links created"));

    let listing = run(&cli(&["ls", out])).unwrap();
    assert!(listing.contains("/1.1/measurement/det"));
    assert!(listing.contains("/1.1/measurement/mca_0/data"));
    assert!(listing.contains("/1.1/measurement/mca_0/info/channels"));
    assert!(listing.contains("Dataset {2, 3} float64"));
}

#[test]
fn convert_twice_fails_with_default_mode() {
    let dir = tempfile::tempdir().unwrap();
    let spec = dir.path().join("scan.dat");
    let out = dir.path().join("scan.h5");
    fs::write(&spec, SCAN).unwrap();
    let spec = spec.to_str().unwrap();
    let out = out.to_str().unwrap();

    run(&cli(&["convert", spec, out])).unwrap();
    let err = run(&cli(&["convert", spec, out])).unwrap_err();
    assert!(matches!(err, CliError::Convert(_)));

    run(&cli(&["convert", spec, out, "--mode", "w"])).unwrap();
}

#[test]
fn convert_with_append_mode_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let spec = dir.path().join("scan.dat");
    let out = dir.path().join("scan.h5");
    fs::write(&spec, SCAN).unwrap();

    let err = run(&cli(&[
        "convert",
        spec.to_str().unwrap(),
        out.to_str().unwrap(),
        "--mode",
        "a",
    ]))
    .unwrap_err();
    assert!(err.to_string().starts_with("configuration error"));
    assert!(!out.exists());
}

#[test]
fn write_skips_existing_members() {
    let dir = tempfile::tempdir().unwrap();
    let spec = dir.path().join("scan.dat");
    let out = dir.path().join("scan.h5");
    fs::write(&spec, SCAN).unwrap();
    let spec = spec.to_str().unwrap();
    let out = out.to_str().unwrap();

    run(&cli(&["write", spec, out, "--h5path", "/entry"])).unwrap();
    let summary = run(&cli(&["write", spec, out, "--h5path", "/entry"])).unwrap();
    assert!(summary.contains("already present"));

    let summary = run(&cli(&["write", spec, out, "--h5path", "/entry", "--overwrite"])).unwrap();
    assert!(summary.contains("overwritten"));
}

#[test]
fn ls_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.h5");
    let err = run(&cli(&["ls", missing.to_str().unwrap()])).unwrap_err();
    assert!(matches!(err, CliError::Tree(_)));
}
