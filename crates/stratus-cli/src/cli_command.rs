use crate::cli_args::*;
use crate::modules::session::Session;
use crate::modules::system::{
    handle_endpoint_command, handle_request_command, handle_token_command,
};

pub(crate) async fn handle_command(
    command: Command,
    session: &mut Session,
    show_timings: bool,
) -> anyhow::Result<()> {
    match command {
        Command::Token => handle_token_command(session).await?,
        Command::Endpoint(args) => handle_endpoint_command(args, session).await?,
        Command::Request(args) => handle_request_command(args, session, show_timings).await?,
        Command::Config(_) => unreachable!(),
    }

    Ok(())
}
