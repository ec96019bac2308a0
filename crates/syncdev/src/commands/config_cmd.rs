//! Config subcommand handlers.

use syncdev_config::{Config, ConfigError};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Resolved};
use crate::error::CliError;
use crate::output;

pub fn handle(
    args: ConfigArgs,
    cfg: &Config,
    global: &GlobalOpts,
    settings: Resolved,
) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let rendered = match settings.output {
                OutputFormat::Text => toml::to_string_pretty(cfg).map_err(ConfigError::from)?,
                OutputFormat::Json => output::render_json(cfg)?,
            };
            output::print_output(rendered.trim_end(), settings.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = config::config_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            syncdev_config::save_config_to(&Config::default(), &path)?;
            eprintln!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}
