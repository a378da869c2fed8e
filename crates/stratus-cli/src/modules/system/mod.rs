mod actions;
pub(crate) mod args;
pub(crate) mod config;
pub(crate) mod types;

pub(crate) use actions::{handle_endpoint_command, handle_request_command, handle_token_command};
#[cfg(test)]
pub(crate) use config::ensure_secure_addr;
pub(crate) use config::{build_session_config, handle_config_command, load_config, save_config};
#[cfg(test)]
pub(crate) use types::{CliConfig, CliContext};
