//! Layered configuration: defaults, TOML file, environment and CLI flags.

use std::fs;
use std::sync::MutexGuard;

use clap::Parser;
use secview::classify::SymbolCountPolicy;
use secview::cli::Cli;
use secview::config::{Config, ConfigError};
use tempfile::tempdir;

fn lock_env() -> MutexGuard<'static, ()> {
    let guard = crate::ENV_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    for (key, _) in std::env::vars() {
        if key.starts_with("SECVIEW_") {
            std::env::remove_var(key);
        }
    }
    std::env::remove_var("NO_COLOR");
    guard
}

#[test]
fn test_missing_file_uses_defaults() {
    let _env = lock_env();
    let dir = tempdir().unwrap();
    let config = Config::load_from_path(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_toml_file_overrides_defaults() {
    let _env = lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
base_url = "https://reports.internal/view"
symbol_count_policy = "stripped-is-secure"
pretty_json = false
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.base_url, "https://reports.internal/view");
    assert_eq!(config.symbol_count_policy, SymbolCountPolicy::StrippedIsSecure);
    assert!(!config.pretty_json);
    assert!(config.color);
}

#[test]
fn test_hierarchy_file_env_cli() {
    let _env = lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "base_url = \"https://from-file/\"\nsymbol_count_policy = \"symbols-is-secure\"\n",
    )
    .unwrap();

    std::env::set_var("SECVIEW_BASE_URL", "https://from-env/");
    std::env::set_var("SECVIEW_COLOR", "false");

    let mut config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.base_url, "https://from-env/");
    assert!(!config.color);
    assert_eq!(config.symbol_count_policy, SymbolCountPolicy::SymbolsIsSecure);

    let cli = Cli::try_parse_from([
        "secview",
        "--symbol-policy",
        "informational",
        "view",
        "a.json",
    ])
    .unwrap();
    config.merge_cli(&cli);
    assert_eq!(config.symbol_count_policy, SymbolCountPolicy::Informational);
    assert_eq!(config.base_url, "https://from-env/");

    std::env::remove_var("SECVIEW_BASE_URL");
    std::env::remove_var("SECVIEW_COLOR");
}

#[test]
fn test_no_color_flag_wins() {
    let _env = lock_env();
    let mut config = Config::default();
    let cli = Cli::try_parse_from(["secview", "--no-color", "view", "a.json"]).unwrap();
    config.merge_cli(&cli);
    assert!(!config.color);
}

#[test]
fn test_invalid_value_is_reported() {
    let _env = lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "symbol_count_policy = \"sometimes\"\n").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_invalid_env_value_is_reported() {
    let _env = lock_env();
    let dir = tempdir().unwrap();
    std::env::set_var("SECVIEW_PRETTY_JSON", "[1, 2]");
    let result = Config::load_from_path(&dir.path().join("none.toml"));
    std::env::remove_var("SECVIEW_PRETTY_JSON");
    assert!(result.is_err());
}

#[test]
fn test_env_base_url_is_validated() {
    let _env = lock_env();
    let dir = tempdir().unwrap();
    std::env::set_var("SECVIEW_BASE_URL", "reports.internal/view");
    let result = Config::load_from_path(&dir.path().join("none.toml"));
    std::env::remove_var("SECVIEW_BASE_URL");
    assert!(matches!(result, Err(ConfigError::InvalidBaseUrl(_))));
}

#[test]
fn test_env_base_url_is_trimmed() {
    let _env = lock_env();
    let dir = tempdir().unwrap();
    std::env::set_var("SECVIEW_BASE_URL", "  https://reports.internal/view ");
    let result = Config::load_from_path(&dir.path().join("none.toml"));
    std::env::remove_var("SECVIEW_BASE_URL");
    assert_eq!(result.unwrap().base_url, "https://reports.internal/view");
}
