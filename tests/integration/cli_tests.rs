//! Running the application end to end through `run_app`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::MutexGuard;

use clap::Parser;
use secview::cli::Cli;
use secview::error::ExitCode;
use secview::export::ExportError;
use secview::run_app;
use tempfile::{tempdir, TempDir};

const REPORT: &str = r#"{"version":"0.1.0","filename":"x","binary_type":"Elf64",
    "properties":{"nx":"Enabled","relro":"Full","canary":false}}"#;

struct Fixture {
    _env: MutexGuard<'static, ()>,
    dir: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let env = crate::ENV_MUTEX
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let dir = tempdir().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "color = false\n").unwrap();
        Self {
            _env: env,
            dir,
            config,
        }
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let mut argv = vec!["secview", "-q", "--config", self.config.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_app(Cli::try_parse_from(argv).unwrap())
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_view_all_success() {
    let fx = Fixture::new();
    let a = fx.file("a.json", REPORT);
    let b = fx.file("b.json", REPORT);
    let code = fx.run(&["view", arg(&a), arg(&b)]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_view_partial_success() {
    let fx = Fixture::new();
    let a = fx.file("a.json", REPORT);
    let bad = fx.file("bad.bin", "not a report");
    let code = fx
        .run(&["view", arg(&a), arg(&bad), "--output", "json"])
        .unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
}

#[test]
fn test_view_nothing_succeeds() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("missing.json");
    let code = fx.run(&["view", arg(&missing)]).unwrap();
    assert_eq!(code, ExitCode::NoSuccessfulReports);
}

#[test]
fn test_export_combined_to_file() {
    let fx = Fixture::new();
    let a = fx.file("a.json", REPORT);
    let bad = fx.file("bad.bin", "");
    let b = fx.file("b.json", REPORT);
    let out = fx.dir.path().join("findings.sarif");

    let code = fx
        .run(&[
            "export",
            arg(&a),
            arg(&bad),
            arg(&b),
            "--combined",
            "--out",
            arg(&out),
        ])
        .unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["version"], "2.1.0");
    let runs = doc["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["artifacts"][0]["location"]["uri"], "a.json");
    assert_eq!(runs[1]["artifacts"][0]["location"]["uri"], "b.json");
    assert_eq!(runs[0]["tool"]["driver"]["name"], "secview");
}

#[test]
fn test_export_per_file_numbered() {
    let fx = Fixture::new();
    let a = fx.file("a.json", REPORT);
    let b = fx.file("b.json", REPORT);
    let out = fx.dir.path().join("out.json");

    fx.run(&["export", arg(&a), arg(&b), "--out", arg(&out)])
        .unwrap();

    assert!(fx.dir.path().join("out-1.json").exists());
    assert!(fx.dir.path().join("out-2.json").exists());
    assert!(!out.exists());
}

#[test]
fn test_export_with_no_reports_fails() {
    let fx = Fixture::new();
    let bad = fx.file("bad.bin", "");
    let err = fx.run(&["export", arg(&bad)]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExportError>(),
        Some(ExportError::NoReports)
    ));
}

#[test]
fn test_share_of_failed_analysis_is_error() {
    let fx = Fixture::new();
    let bad = fx.file("bad.bin", "");
    assert!(fx.run(&["share", arg(&bad)]).is_err());
}

#[test]
fn test_share_succeeds() {
    let fx = Fixture::new();
    let a = fx.file("a.json", REPORT);
    let code = fx
        .run(&["share", arg(&a), "--base-url", "https://checksec.example/"])
        .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_load_invalid_link() {
    let fx = Fixture::new();
    let code = fx
        .run(&["load", "https://checksec.example/#data=%%%"])
        .unwrap();
    assert_eq!(code, ExitCode::GeneralError);
}

#[test]
fn test_missing_config_file_is_error() {
    let fx = Fixture::new();
    let a = fx.file("a.json", REPORT);
    let missing = fx.dir.path().join("nope.toml");
    let cli = Cli::try_parse_from(["secview", "-q", "--config", arg(&missing), "view", arg(&a)])
        .unwrap();
    assert!(run_app(cli).is_err());
}
