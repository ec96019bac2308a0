//! Client configuration for SyncDev tools.
//!
//! A TOML file in the platform config directory, overridable through
//! `SYNCDEV_`-prefixed environment variables, translated into
//! `syncdev_core::StoreConfig`. This covers the client's own settings only;
//! the backend's configuration reaches the store through the update sink.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use syncdev_core::model::DEFAULT_EVENT_LOG_CAPACITY;
use syncdev_core::{StoreConfig, Tab};

/// Environment variable prefix. Nested keys use a double underscore, e.g.
/// `SYNCDEV_STATE__EVENT_LOG_CAPACITY=50`.
pub const ENV_PREFIX: &str = "SYNCDEV_";

const OUTPUT_FORMATS: [&str; 2] = ["text", "json"];
const COLOR_MODES: [&str; 3] = ["auto", "always", "never"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Settings for the client state store.
    #[serde(default)]
    pub state: StateSection,

    /// CLI output defaults.
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StateSection {
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,

    #[serde(default)]
    pub initial_tab: Tab,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            event_log_capacity: default_event_log_capacity(),
            initial_tab: Tab::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// `text` or `json`.
    #[serde(default = "default_output")]
    pub output: String,

    /// `auto`, `always` or `never`.
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_event_log_capacity() -> usize {
    DEFAULT_EVENT_LOG_CAPACITY
}
fn default_output() -> String {
    "text".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.state.event_log_capacity == 0 {
            return Err(validation(
                "state.event_log_capacity",
                "must be at least 1",
            ));
        }
        if !OUTPUT_FORMATS.contains(&self.defaults.output.as_str()) {
            return Err(validation(
                "defaults.output",
                format!("expected 'text' or 'json', got '{}'", self.defaults.output),
            ));
        }
        if !COLOR_MODES.contains(&self.defaults.color.as_str()) {
            return Err(validation(
                "defaults.color",
                format!(
                    "expected 'auto', 'always', or 'never', got '{}'",
                    self.defaults.color
                ),
            ));
        }
        Ok(())
    }

    /// Settings for a fresh `StateStore`.
    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig {
            event_log_capacity: self.state.event_log_capacity,
            initial_tab: self.state.initial_tab,
        }
    }
}

fn validation(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "syncdev", "syncdev").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("syncdev");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load and validate the config from `path` + environment. A missing file
/// yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if it is missing or invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
