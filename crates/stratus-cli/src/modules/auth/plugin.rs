use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use stratus_core::TokenRequest;

use crate::modules::session::{ClientError, Session};

pub(crate) const APIKEY_AUTH_SYSTEM: &str = "apikey";

/// A vendor authentication extension selected by name.
#[async_trait]
pub trait AuthPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Identity URL to use when none is configured.
    fn identity_url(&self) -> Result<String, ClientError>;

    /// Authenticates `session` against `identity_url`, returning a location
    /// to retry against when the service redirects.
    async fn authenticate(
        &self,
        session: &mut Session,
        identity_url: &str,
    ) -> Result<Option<String>, ClientError>;
}

#[derive(Clone, Default)]
pub struct AuthSystemRegistry {
    plugins: HashMap<String, Arc<dyn AuthPlugin>>,
}

impl AuthSystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ApiKeyAuth::default()));
        registry
    }

    pub fn register(&mut self, plugin: Arc<dyn AuthPlugin>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn AuthPlugin>, ClientError> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::AuthSystemNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for AuthSystemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSystemRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

/// Token exchange with a user name and API key instead of a password. The
/// configured secret is sent as the key.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyAuth {
    identity_url: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(identity_url: Option<String>) -> Self {
        Self { identity_url }
    }
}

#[async_trait]
impl AuthPlugin for ApiKeyAuth {
    fn name(&self) -> &str {
        APIKEY_AUTH_SYSTEM
    }

    fn identity_url(&self) -> Result<String, ClientError> {
        self.identity_url.clone().ok_or_else(|| {
            ClientError::AuthorizationFailure(format!(
                "auth system '{APIKEY_AUTH_SYSTEM}' has no default identity URL"
            ))
        })
    }

    async fn authenticate(
        &self,
        session: &mut Session,
        identity_url: &str,
    ) -> Result<Option<String>, ClientError> {
        let credential = &session.config().credential;
        let (Some(user), Some(api_key)) = (credential.user(), credential.secret()) else {
            return Err(ClientError::AuthorizationFailure(format!(
                "auth system '{APIKEY_AUTH_SYSTEM}' needs a user name and an API key"
            )));
        };
        let request = TokenRequest::api_key(user, api_key)
            .scoped(session.tenant_id(), session.config().project_id.as_deref());
        session.authenticate_with_body(identity_url, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_auth_system_is_an_error() {
        let registry = AuthSystemRegistry::with_builtin();
        assert_eq!(registry.names(), vec![APIKEY_AUTH_SYSTEM]);
        assert!(registry.resolve(APIKEY_AUTH_SYSTEM).is_ok());
        assert!(matches!(
            registry.resolve("missing"),
            Err(ClientError::AuthSystemNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn api_key_identity_url_must_be_configured() {
        assert!(ApiKeyAuth::default().identity_url().is_err());
        assert_eq!(
            ApiKeyAuth::new(Some("https://identity/v2.0".into()))
                .identity_url()
                .expect("url"),
            "https://identity/v2.0"
        );
    }
}
