use clap::Parser;

mod cli_args;
mod cli_command;
mod modules;

use crate::cli_args::*;
use crate::cli_command::handle_command;
use crate::modules::cache::{KeyringCache, KEYRING_SERVICE};
use crate::modules::session::Session;
use crate::modules::system::{build_session_config, handle_config_command, load_config, save_config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.auth.debug)?;
    let mut config = load_config()?;

    let command = match cli.command {
        Command::Config(args) => {
            handle_config_command(args, &mut config)?;
            save_config(&config)?;
            return Ok(());
        }
        command => command,
    };

    let settings = build_session_config(&cli.auth, cli.context.as_deref(), &config)?;
    let mut session = Session::new(settings.session)?;
    if settings.use_cache {
        session = session.with_cache(Box::new(KeyringCache::new(KEYRING_SERVICE)));
    }
    handle_command(command, &mut session, cli.timings).await
}

fn init_logging(verbosity: u8, http_debug: bool) -> anyhow::Result<()> {
    // The HTTP transcript is emitted at info.
    let verbosity = if http_debug { verbosity.max(1) } else { verbosity };
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
