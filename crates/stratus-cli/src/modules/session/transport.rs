use std::time::Instant;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{redirect, Method};
use serde_json::Value;
use stratus_core::{
    classify, HeaderFields, ServiceCatalog, CACHE_KEY_PLACEHOLDER, HEADER_AUTH_TOKEN,
    HEADER_PROJECT_ID, MAX_AUTH_REDIRECTS,
};
use tracing::{debug, info, warn};

use super::transcript;
use super::{ApiResponse, ClientError, IdentityProtocol, SessionConfig, Timing};
use crate::modules::auth::AuthSystemRegistry;
use crate::modules::cache::{CachedAuth, CredentialCache};

const USER_AGENT_VALUE: &str = concat!("stratus/", env!("CARGO_PKG_VERSION"));
const REFUSED_MARKERS: [&str; 2] = ["Connection refused", "actively refused"];

/// Authenticated connection to the compute API.
///
/// Holds the token and resolved base URL for one caller. Every method that
/// touches that state takes `&mut self`, so one logical request is in flight
/// at a time.
pub struct Session {
    pub(crate) config: SessionConfig,
    client: reqwest::Client,
    redirect_client: reqwest::Client,
    pub(crate) registry: AuthSystemRegistry,
    cache: Option<Box<dyn CredentialCache>>,
    pub(crate) auth_token: Option<String>,
    pub(crate) base_url: Option<String>,
    pub(crate) tenant_id: Option<String>,
    pub(crate) catalog: Option<ServiceCatalog>,
    pub(crate) protocol: Option<IdentityProtocol>,
    pub(crate) used_cache: bool,
    timings: Vec<Timing>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, ClientError> {
        let client = build_client(&config, redirect::Policy::none())?;
        let redirect_client =
            build_client(&config, redirect::Policy::limited(MAX_AUTH_REDIRECTS))?;
        let auth_token = match &config.credential {
            super::Credential::Token(token) => Some(token.clone()),
            _ => None,
        };
        let base_url = config.bypass_url.clone();
        let tenant_id = config.tenant_id.clone();
        Ok(Self {
            config,
            client,
            redirect_client,
            registry: AuthSystemRegistry::with_builtin(),
            cache: None,
            auth_token,
            base_url,
            tenant_id,
            catalog: None,
            protocol: None,
            used_cache: false,
            timings: Vec::new(),
        })
    }

    pub fn with_cache(mut self, cache: Box<dyn CredentialCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_registry(mut self, registry: AuthSystemRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn catalog(&self) -> Option<&ServiceCatalog> {
        self.catalog.as_ref()
    }

    pub fn protocol(&self) -> Option<&IdentityProtocol> {
        self.protocol.as_ref()
    }

    pub fn used_cache(&self) -> bool {
        self.used_cache
    }

    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = Some(url.trim_end_matches('/').to_string());
    }

    pub fn timings(&self) -> &[Timing] {
        &self.timings
    }

    pub fn reset_timings(&mut self) {
        self.timings.clear();
    }

    /// Forgets the token and endpoint; the next authenticated call logs in again.
    pub fn unauthenticate(&mut self) {
        self.auth_token = None;
        self.base_url = None;
        self.catalog = None;
        self.used_cache = false;
    }

    pub async fn request(
        &mut self,
        url: &str,
        method: Method,
        headers: Option<HeaderMap>,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        self.send(url, method, headers.unwrap_or_default(), body, false)
            .await
    }

    pub async fn get(&mut self, path: &str) -> Result<ApiResponse, ClientError> {
        self.authenticated_request(path, Method::GET, None).await
    }

    pub async fn post(&mut self, path: &str, body: &Value) -> Result<ApiResponse, ClientError> {
        self.authenticated_request(path, Method::POST, Some(body))
            .await
    }

    pub async fn put(&mut self, path: &str, body: &Value) -> Result<ApiResponse, ClientError> {
        self.authenticated_request(path, Method::PUT, Some(body))
            .await
    }

    pub async fn delete(&mut self, path: &str) -> Result<ApiResponse, ClientError> {
        self.authenticated_request(path, Method::DELETE, None).await
    }

    /// Sends `path` relative to the resolved base URL, logging in first if
    /// needed. An unauthorized reply triggers one fresh login and one retry.
    pub async fn authenticated_request(
        &mut self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        if self.base_url.is_none() {
            self.authenticate().await?;
        }
        match self.send_with_token(path, method.clone(), body).await {
            Err(err) if err.is_unauthorized() => {
                info!(
                    method = %method,
                    path = %path,
                    "request unauthorized; re-authenticating"
                );
                self.reauthenticate().await?;
                self.send_with_token(path, method, body).await
            }
            result => result,
        }
    }

    async fn send_with_token(
        &mut self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let base_url = self.base_url.clone().unwrap_or_default();
        let mut headers = HeaderMap::new();
        if let Some(token) = self.auth_token.as_deref() {
            headers.insert(
                HeaderName::from_static(HEADER_AUTH_TOKEN),
                HeaderValue::from_str(token)?,
            );
        }
        if let Some(project_id) = self.config.project_id.as_deref() {
            headers.insert(
                HeaderName::from_static(HEADER_PROJECT_ID),
                HeaderValue::from_str(project_id)?,
            );
        }
        let url = format!("{base_url}{path}");
        self.send(&url, method, headers, body, false).await
    }

    pub(crate) async fn send(
        &mut self,
        url: &str,
        method: Method,
        headers: HeaderMap,
        body: Option<&Value>,
        follow_redirects: bool,
    ) -> Result<ApiResponse, ClientError> {
        let client = if follow_redirects {
            &self.redirect_client
        } else {
            &self.client
        };
        let mut builder = client
            .request(method.clone(), url)
            .headers(headers)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let request = builder.build()?;
        self.log_transcript(|| transcript::request_line(&request));

        let started_at = Utc::now();
        let start = Instant::now();
        let response = client.execute(request).await?;
        let status = response.status().as_u16();
        let headers = header_fields(response.headers());
        let text = response.text().await?;
        self.timings.push(Timing {
            label: format!("{method} {url}"),
            start: started_at,
            end: Utc::now(),
        });
        debug!(
            method = %method,
            url = %url,
            status = status,
            elapsed_ms = start.elapsed().as_millis(),
            "http response"
        );
        self.log_transcript(|| transcript::response_line(status, &headers, &text));

        if status == 400 && REFUSED_MARKERS.iter().any(|marker| text.contains(marker)) {
            return Err(ClientError::ConnectionRefused(text));
        }
        let body = parse_body(text);
        if status >= 400 {
            let err = classify(status, &headers, body.as_ref()).with_request(method.as_str(), url);
            return Err(err.into());
        }
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    fn log_transcript(&self, line: impl FnOnce() -> String) {
        if self.config.http_log_debug {
            info!("{}", line());
        } else if tracing::enabled!(tracing::Level::DEBUG) {
            debug!("{}", line());
        }
    }

    /// Composite cache key; unset components become a placeholder.
    pub(crate) fn cache_key(&self, identity_url: &str) -> String {
        let visibility = self.config.visibility.url_key();
        let filter = &self.config.filter;
        [
            Some(identity_url),
            self.config.credential.user(),
            filter.region.as_deref(),
            Some(visibility),
            filter.service_type.as_deref(),
            filter.service_name.as_deref(),
            filter.secondary_service_name.as_deref(),
        ]
        .iter()
        .map(|part| part.unwrap_or(CACHE_KEY_PLACEHOLDER))
        .collect::<Vec<_>>()
        .join("/")
    }

    pub(crate) fn load_cached(&mut self, key: &str) -> bool {
        let Some(cache) = self.cache.as_ref() else {
            return false;
        };
        match cache.get(key) {
            Ok(Some(cached)) => {
                debug!(key = %key, "using cached credentials");
                self.auth_token = Some(cached.token);
                self.base_url = Some(cached.base_url);
                self.used_cache = true;
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!(key = %key, "credential cache lookup failed: {err}");
                false
            }
        }
    }

    pub(crate) fn store_cached(&self, key: &str) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let (Some(token), Some(base_url)) = (self.auth_token.as_ref(), self.base_url.as_ref())
        else {
            return;
        };
        let value = CachedAuth {
            token: token.clone(),
            base_url: base_url.clone(),
        };
        if let Err(err) = cache.set(key, &value) {
            warn!(key = %key, "failed to store credentials in cache: {err}");
        }
    }
}

fn build_client(
    config: &SessionConfig,
    policy: redirect::Policy,
) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder()
        .danger_accept_invalid_certs(config.insecure)
        .redirect(policy);
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(ClientError::Transport)
}

fn header_fields(headers: &HeaderMap) -> HeaderFields {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

fn parse_body(text: String) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::session::Credential;

    fn session() -> Session {
        let mut config = SessionConfig::new(
            "http://identity:5000/v2.0",
            Credential::Password {
                username: "demo".into(),
                password: "secret".into(),
            },
        );
        config.filter.region = Some("North".into());
        Session::new(config).expect("session")
    }

    #[test]
    fn cache_key_uses_placeholder_for_unset_parts() {
        let session = session();
        assert_eq!(
            session.cache_key("http://identity:5000/v2.0"),
            "http://identity:5000/v2.0/demo/North/publicURL/?/?/?"
        );
    }

    #[test]
    fn unauthenticate_clears_session_state() {
        let mut session = session();
        session.auth_token = Some("tok".into());
        session.set_base_url("http://compute/v2/");
        session.used_cache = true;
        assert_eq!(session.base_url(), Some("http://compute/v2"));

        session.unauthenticate();
        assert!(session.auth_token().is_none());
        assert!(session.base_url().is_none());
        assert!(!session.used_cache());
    }

    #[test]
    fn body_parsing_keeps_raw_text() {
        assert_eq!(parse_body(String::new()), None);
        assert_eq!(
            parse_body("{\"a\":1}".into()),
            Some(serde_json::json!({"a": 1}))
        );
        assert_eq!(
            parse_body("oops".into()),
            Some(Value::String("oops".into()))
        );
    }
}
