//! Application configuration.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed `SECVIEW_` (`__` separates nested keys)
//! 4. Command-line flags, applied with [`Config::merge_cli`]
//!
//! # Example
//!
//! ```toml
//! base_url = "https://checksec.example/"
//! symbol_count_policy = "stripped-is-secure"
//! color = true
//! pretty_json = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::classify::SymbolCountPolicy;
use crate::cli::{parse_base_url, Cli};
use crate::controller::DEFAULT_BASE_URL;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SECVIEW_";

/// Configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A layer held an invalid value or the TOML could not be parsed
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// An explicitly requested file does not exist
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// `base_url` from the file or environment is not a usable page URL
    #[error("invalid base_url: {0}")]
    InvalidBaseUrl(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Invalid(Box::new(e))
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page URL share links are built on.
    pub base_url: String,
    /// How `symbol_count` is judged.
    pub symbol_count_policy: SymbolCountPolicy,
    /// Colored text output.
    pub color: bool,
    /// Indent JSON output.
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            symbol_count_policy: SymbolCountPolicy::default(),
            color: true,
            pretty_json: true,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// With `explicit` set, that file must exist. Otherwise the platform
    /// default file is used when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or any layer
    /// holds an invalid value.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(&path),
                None => {
                    log::debug!("No platform config directory, skipping config file");
                    Self::figment(None).extract::<Self>()?.validated()
                }
            },
        }
    }

    /// Load using a specific config file; a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any layer holds an invalid value,
    /// including a `base_url` that is not an http(s) URL with a host.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading config from {}", path.display());
        let config = Self::figment(Some(path)).extract::<Self>()?.validated()?;
        log::trace!("Effective config: {:?}", config);
        Ok(config)
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(&self.base_url).map_err(ConfigError::InvalidBaseUrl)?;
        Ok(self)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Platform-specific default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "secview").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line overrides.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if cli.no_color {
            self.color = false;
        }
        if let Some(policy) = cli.symbol_policy {
            self.symbol_count_policy = policy;
        }
    }
}
