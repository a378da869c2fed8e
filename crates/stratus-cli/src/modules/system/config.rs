use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stratus_core::{EndpointFilter, Visibility, ADMIN_IDENTITY_PORT};

use super::args::{ConfigArgs, ConfigCommand};
use super::types::{CliConfig, CliContext};
use crate::cli_args::AuthOptions;
use crate::modules::session::{Credential, SessionConfig};

#[derive(Debug)]
pub(crate) struct SessionSettings {
    pub session: SessionConfig,
    pub use_cache: bool,
}

pub(crate) fn handle_config_command(
    args: ConfigArgs,
    config: &mut CliConfig,
) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::SetContext(args) => {
            let entry = config.contexts.entry(args.name.clone()).or_default();
            merge(&mut entry.auth_url, args.auth_url);
            merge(&mut entry.username, args.username);
            merge(&mut entry.user_id, args.user_id);
            merge(&mut entry.tenant_name, args.tenant_name);
            merge(&mut entry.tenant_id, args.tenant_id);
            merge(&mut entry.region_name, args.region_name);
            if let Some(endpoint_type) = args.endpoint_type {
                let visibility = endpoint_type
                    .parse::<Visibility>()
                    .map_err(anyhow::Error::msg)?;
                entry.endpoint_type = Some(visibility.to_string());
            }
            merge(&mut entry.service_type, args.service_type);
            merge(&mut entry.service_name, args.service_name);
            merge(&mut entry.volume_service_name, args.volume_service_name);
            merge(&mut entry.auth_system, args.auth_system);
            merge(&mut entry.bypass_url, args.bypass_url);
            if let Some(timeout) = args.timeout {
                entry.timeout_secs = Some(timeout);
            }
            if let Some(cache) = args.cache {
                entry.cache = cache;
            }
            if let Some(insecure) = args.insecure {
                entry.insecure = insecure;
            }
            config.current_context = Some(args.name);
        }
        ConfigCommand::UseContext(args) => {
            if !config.contexts.contains_key(&args.name) {
                anyhow::bail!("context not found: {}", args.name);
            }
            config.current_context = Some(args.name);
        }
        ConfigCommand::CurrentContext => {
            if let Some(current) = config.current_context.clone() {
                println!("{current}");
            }
        }
        ConfigCommand::GetContexts => {
            let mut names: Vec<_> = config.contexts.keys().cloned().collect();
            names.sort();
            for name in names {
                let marker = if config.current_context.as_ref() == Some(&name) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {name}");
            }
        }
    }
    Ok(())
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("HOME is not set"))?;
    Ok(Path::new(&home).join(".stratus").join("config.json"))
}

pub(crate) fn load_config() -> anyhow::Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let config = serde_json::from_str(&contents)?;
    Ok(config)
}

pub(crate) fn save_config(config: &CliConfig) -> anyhow::Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub(crate) fn ensure_secure_addr(addr: &str, allow_insecure: bool) -> anyhow::Result<()> {
    if addr.starts_with("http://") && !allow_insecure {
        anyhow::bail!("refusing to use http:// without --insecure");
    }
    Ok(())
}

/// Flags and environment win over the selected context.
pub(crate) fn build_session_config(
    options: &AuthOptions,
    context_arg: Option<&str>,
    config: &CliConfig,
) -> anyhow::Result<SessionSettings> {
    let context_name = context_arg
        .map(str::to_string)
        .or_else(|| config.current_context.clone());
    let context = match context_name.as_deref() {
        Some(name) => config
            .contexts
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("context not found: {name}"))?,
        None => CliContext::default(),
    };
    let pick = |flag: &Option<String>, stored: &Option<String>| flag.clone().or_else(|| stored.clone());

    let credential = if let Some(token) = options.token.clone() {
        Credential::Token(token)
    } else {
        let password = options
            .password
            .clone()
            .ok_or_else(|| anyhow::anyhow!("password is required (OS_PASSWORD or --password)"))?;
        match (
            pick(&options.user_id, &context.user_id),
            pick(&options.username, &context.username),
        ) {
            (Some(user_id), _) => Credential::UserId { user_id, password },
            (None, Some(username)) => Credential::Password { username, password },
            (None, None) => {
                anyhow::bail!("username is required (OS_USERNAME, --username, or config context)")
            }
        }
    };

    let insecure = options.insecure || context.insecure;
    let identity_url = pick(&options.auth_url, &context.auth_url);
    if let Some(url) = identity_url.as_deref() {
        ensure_secure_addr(url, insecure)?;
    }
    let visibility = pick(&options.endpoint_type, &context.endpoint_type)
        .map(|value| value.parse::<Visibility>().map_err(anyhow::Error::msg))
        .transpose()?
        .unwrap_or_default();
    let filter = EndpointFilter {
        region: pick(&options.region_name, &context.region_name),
        service_type: pick(&options.service_type, &context.service_type),
        service_name: pick(&options.service_name, &context.service_name),
        secondary_service_name: pick(&options.volume_service_name, &context.volume_service_name),
    };

    let session = SessionConfig {
        identity_url,
        credential,
        project_id: pick(&options.tenant_name, &context.tenant_name),
        tenant_id: pick(&options.tenant_id, &context.tenant_id),
        visibility,
        filter,
        auth_system: pick(&options.auth_system, &context.auth_system),
        proxy_token: options.proxy_token.clone(),
        proxy_tenant_id: options.proxy_tenant_id.clone(),
        bypass_url: pick(&options.bypass_url, &context.bypass_url),
        admin_port: ADMIN_IDENTITY_PORT,
        timeout: options
            .timeout
            .or(context.timeout_secs)
            .map(Duration::from_secs),
        insecure,
        http_log_debug: options.debug,
    };
    Ok(SessionSettings {
        session,
        use_cache: options.os_cache || context.cache,
    })
}
