use clap::{Args, Subcommand};

#[derive(Args)]
pub struct EndpointArgs {
    #[arg(help = "Service type to resolve (e.g. compute, volume)")]
    pub service_type: Option<String>,
}

#[derive(Args)]
pub struct RequestArgs {
    #[arg(help = "HTTP method (GET, POST, PUT, DELETE)")]
    pub method: String,
    #[arg(help = "Path relative to the resolved service URL (e.g. /servers)")]
    pub path: String,
    #[arg(long, help = "JSON request body")]
    pub data: Option<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Create or update a context")]
    SetContext(SetContextArgs),
    #[command(about = "Set the active context")]
    UseContext(UseContextArgs),
    #[command(about = "Print the active context name")]
    CurrentContext,
    #[command(about = "List known context names")]
    GetContexts,
}

#[derive(Args)]
pub struct SetContextArgs {
    #[arg(help = "Context name")]
    pub name: String,
    #[arg(long, help = "Identity service URL")]
    pub auth_url: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub user_id: Option<String>,
    #[arg(long)]
    pub tenant_name: Option<String>,
    #[arg(long)]
    pub tenant_id: Option<String>,
    #[arg(long)]
    pub region_name: Option<String>,
    #[arg(long, help = "Endpoint visibility: public, internal or admin")]
    pub endpoint_type: Option<String>,
    #[arg(long)]
    pub service_type: Option<String>,
    #[arg(long)]
    pub service_name: Option<String>,
    #[arg(long)]
    pub volume_service_name: Option<String>,
    #[arg(long)]
    pub auth_system: Option<String>,
    #[arg(long)]
    pub bypass_url: Option<String>,
    #[arg(long, help = "Per-request timeout in seconds")]
    pub timeout: Option<u64>,
    #[arg(long, help = "Cache tokens in the OS keychain")]
    pub cache: Option<bool>,
    #[arg(long, help = "Allow http:// and invalid TLS certificates")]
    pub insecure: Option<bool>,
}

#[derive(Args)]
pub struct UseContextArgs {
    #[arg(help = "Context name")]
    pub name: String,
}
