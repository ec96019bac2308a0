//! Command dispatch: bridges CLI args -> store/config operations -> output.

pub mod check_config;
pub mod config_cmd;
pub mod replay;
pub mod util;

use clap::CommandFactory;
use syncdev_config::Config;

use crate::cli::{Cli, Command, ConfigCommand, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Whether a command reads the config file. `config init` and `config path`
/// must work even when the file is missing or broken.
pub fn needs_config(cmd: &Command) -> bool {
    match cmd {
        Command::Config(args) => matches!(args.command, ConfigCommand::Show),
        Command::Completions(_) => false,
        Command::Replay(_) | Command::CheckConfig(_) => true,
    }
}

/// Dispatch a command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    cfg: &Config,
    global: &GlobalOpts,
    settings: Resolved,
) -> Result<(), CliError> {
    match cmd {
        Command::Replay(args) => replay::handle(args, cfg, settings).await,
        Command::CheckConfig(args) => check_config::handle(args, settings).await,
        Command::Config(args) => config_cmd::handle(args, cfg, global, settings),
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "syncdev", &mut std::io::stdout());
            Ok(())
        }
    }
}
