use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const DATASET: &str = r#"{
  "metadata": {"title": "Acme FY24"},
  "nodes": [
    {"id": "Revenue", "depth": 0, "value": 1000, "category": "revenue"},
    {"id": "Expenses", "depth": 1, "value": 600, "category": "expense"},
    {"id": "Net Income", "depth": 1, "value": 400, "category": "profit"}
  ],
  "links": [
    {"source": "Revenue", "target": "Expenses", "value": 600},
    {"source": "Revenue", "target": "Net Income", "value": 400}
  ]
}"#;

fn fixture(dir: &Path) -> PathBuf {
    let path = dir.join("acme.json");
    fs::write(&path, DATASET).expect("write fixture");
    path
}

fn cli() -> Command {
    Command::new(assert_cmd::cargo_bin!("ledgerflow"))
}

#[test]
fn cli_renders_svg_to_stdout() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = fixture(tmp.path());

    let output = cli()
        .args(["render", "--id", "acme", input.to_string_lossy().as_ref()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let svg = String::from_utf8(output).expect("utf-8 svg");
    assert!(svg.starts_with(r#"<svg id="acme""#));
    assert!(svg.contains(r#"data-key="link:Revenue-&gt;Net Income#0""#));
}

#[test]
fn cli_writes_csv_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = fixture(tmp.path());
    let out = tmp.path().join("acme.csv");

    cli()
        .args([
            "render",
            "--format",
            "csv",
            "--out",
            out.to_string_lossy().as_ref(),
            input.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let text = fs::read_to_string(&out).expect("read csv");
    assert!(text.starts_with("# title: Acme FY24\n"));
    assert!(text.contains("source,target,value,type"));
}

#[test]
fn cli_prints_layout_json_with_overrides() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = fixture(tmp.path());
    let config = tmp.path().join("options.json");
    fs::write(&config, r#"{"width": 900, "curveIntensity": 0.3}"#).expect("write config");

    let output = cli()
        .args([
            "layout",
            "--config",
            config.to_string_lossy().as_ref(),
            "--curve",
            "0.6",
            input.to_string_lossy().as_ref(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let layout: serde_json::Value = serde_json::from_slice(&output).expect("layout json");
    assert_eq!(layout["kind"], "sankey");
    assert_eq!(layout["width"], 900.0);
    assert_eq!(layout["links"][0]["curvature"], 0.6);
}

#[test]
fn cli_rejects_invalid_options() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = fixture(tmp.path());

    cli()
        .args(["render", "--width", "10", input.to_string_lossy().as_ref()])
        .assert()
        .failure();
    cli().args(["render", "--format", "pdf"]).assert().code(2);
}

#[cfg(feature = "raster")]
#[test]
fn cli_renders_png_with_default_out_path() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = fixture(tmp.path());

    cli()
        .args(["render", "--format", "png", input.to_string_lossy().as_ref()])
        .assert()
        .success();

    let bytes = fs::read(input.with_extension("png")).expect("read png");
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"), "output is not a PNG");
}
