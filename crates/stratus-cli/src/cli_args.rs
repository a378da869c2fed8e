use clap::{ArgAction, Args, Parser, Subcommand};

pub use crate::modules::system::args::*;

#[derive(Parser)]
#[command(name = "stratus")]
#[command(about = "Compute API client")]
pub struct Cli {
    #[command(flatten)]
    pub auth: AuthOptions,
    #[arg(long, env = "STRATUS_CONTEXT")]
    pub context: Option<String>,
    #[arg(long, help = "Print per-request timings to stderr")]
    pub timings: bool,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Clone, Default)]
pub struct AuthOptions {
    #[arg(long, env = "OS_AUTH_URL", help = "Identity service URL")]
    pub auth_url: Option<String>,
    #[arg(long, env = "OS_USERNAME")]
    pub username: Option<String>,
    #[arg(long, env = "OS_USER_ID")]
    pub user_id: Option<String>,
    #[arg(long, env = "OS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long, env = "OS_TOKEN", hide_env_values = true, help = "Existing token")]
    pub token: Option<String>,
    #[arg(long, env = "OS_TENANT_NAME")]
    pub tenant_name: Option<String>,
    #[arg(long, env = "OS_TENANT_ID")]
    pub tenant_id: Option<String>,
    #[arg(long, env = "OS_REGION_NAME")]
    pub region_name: Option<String>,
    #[arg(long, env = "OS_ENDPOINT_TYPE")]
    pub endpoint_type: Option<String>,
    #[arg(long)]
    pub service_type: Option<String>,
    #[arg(long)]
    pub service_name: Option<String>,
    #[arg(long)]
    pub volume_service_name: Option<String>,
    #[arg(long, env = "OS_AUTH_SYSTEM")]
    pub auth_system: Option<String>,
    #[arg(long, hide_env_values = true)]
    pub proxy_token: Option<String>,
    #[arg(long)]
    pub proxy_tenant_id: Option<String>,
    #[arg(long, help = "Use this endpoint instead of the catalog's")]
    pub bypass_url: Option<String>,
    #[arg(long, help = "Per-request timeout in seconds")]
    pub timeout: Option<u64>,
    #[arg(long, env = "OS_CACHE", help = "Cache tokens in the OS keychain")]
    pub os_cache: bool,
    #[arg(long, help = "Log HTTP requests and responses")]
    pub debug: bool,
    #[arg(long, help = "Allow http:// and invalid TLS certificates")]
    pub insecure: bool,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Authenticate and print the token")]
    Token,
    #[command(about = "Resolve a service endpoint from the catalog")]
    Endpoint(EndpointArgs),
    #[command(about = "Send an authenticated request")]
    Request(RequestArgs),
    Config(ConfigArgs),
}
