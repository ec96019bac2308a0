//! Config resolution for the CLI: the shared config file plus flag overrides.

use std::path::PathBuf;

use syncdev_config::Config;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Path of the config file in effect: `--config`, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(syncdev_config::config_path)
}

/// Load the config file in effect. A missing file yields the defaults.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(syncdev_config::load_config_from(&config_path(global))?)
}

/// Settings resolved from flags first, then the config file.
#[derive(Debug, Clone, Copy)]
pub struct Resolved {
    pub output: OutputFormat,
    pub color: ColorMode,
    pub quiet: bool,
}

impl Resolved {
    pub fn new(global: &GlobalOpts, cfg: &Config) -> Self {
        let output = global.output.unwrap_or(match cfg.defaults.output.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        });
        let color = global.color.unwrap_or(match cfg.defaults.color.as_str() {
            "always" => ColorMode::Always,
            "never" => ColorMode::Never,
            _ => ColorMode::Auto,
        });
        Self {
            output,
            color,
            quiet: global.quiet,
        }
    }
}
