use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use stratus_core::{EndpointFilter, HeaderFields, Visibility, ADMIN_IDENTITY_PORT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Password { username: String, password: String },
    UserId { user_id: String, password: String },
    /// An already issued token, exchanged for a scoped one.
    Token(String),
}

impl Credential {
    pub fn user(&self) -> Option<&str> {
        match self {
            Credential::Password { username, .. } => Some(username),
            Credential::UserId { user_id, .. } => Some(user_id),
            Credential::Token(_) => None,
        }
    }

    pub fn secret(&self) -> Option<&str> {
        match self {
            Credential::Password { password, .. } | Credential::UserId { password, .. } => {
                Some(password)
            }
            Credential::Token(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityProtocol {
    Legacy,
    Standard,
    Plugin(String),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub identity_url: Option<String>,
    pub credential: Credential,
    /// Project (tenant) name sent as scope.
    pub project_id: Option<String>,
    pub tenant_id: Option<String>,
    pub visibility: Visibility,
    pub filter: EndpointFilter,
    pub auth_system: Option<String>,
    pub proxy_token: Option<String>,
    pub proxy_tenant_id: Option<String>,
    pub bypass_url: Option<String>,
    pub admin_port: u16,
    pub timeout: Option<Duration>,
    pub insecure: bool,
    pub http_log_debug: bool,
}

impl SessionConfig {
    pub fn new(identity_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            identity_url: Some(identity_url.into()),
            credential,
            project_id: None,
            tenant_id: None,
            visibility: Visibility::default(),
            filter: EndpointFilter::default(),
            auth_system: None,
            proxy_token: None,
            proxy_tenant_id: None,
            bypass_url: None,
            admin_port: ADMIN_IDENTITY_PORT,
            timeout: None,
            insecure: false,
            http_log_debug: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderFields,
    /// Parsed JSON, or the raw text as a string value when it is not JSON.
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Timing {
    pub fn elapsed_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }
}
