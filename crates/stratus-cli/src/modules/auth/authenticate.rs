use std::sync::Arc;

use reqwest::Url;
use stratus_core::{
    ApiError, ApiErrorKind, DEFAULT_AUTH_SYSTEM, DEFAULT_IDENTITY_VERSION, MAX_AUTH_REDIRECTS,
    STANDARD_IDENTITY_VERSION,
};
use tracing::debug;

use super::AuthPlugin;
use crate::modules::session::{ClientError, IdentityProtocol, Session};

/// Counts identity redirects so a misbehaving service cannot loop forever.
#[derive(Default)]
pub(super) struct RedirectBudget {
    hops: usize,
}

impl RedirectBudget {
    pub(super) fn follow(&mut self, location: String) -> Result<String, ClientError> {
        self.hops += 1;
        if self.hops > MAX_AUTH_REDIRECTS {
            return Err(ClientError::TooManyRedirects { location });
        }
        debug!(location = %location, hop = self.hops, "following identity redirect");
        Ok(location)
    }
}

pub(crate) fn parse_url(url: &str) -> Result<Url, ClientError> {
    Url::parse(url).map_err(|err| ClientError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })
}

/// First path segment starting with `v`, e.g. `v2.0`.
pub(crate) fn identity_version(identity_url: &str) -> Result<String, ClientError> {
    let url = parse_url(identity_url)?;
    let version = url
        .path_segments()
        .and_then(|mut segments| {
            segments
                .find(|segment| segment.starts_with('v'))
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_IDENTITY_VERSION.to_string());
    Ok(version)
}

/// Same identity URL on the admin port.
pub(crate) fn admin_identity_url(identity_url: &str, port: u16) -> Result<String, ClientError> {
    let mut url = parse_url(identity_url)?;
    url.set_port(Some(port))
        .map_err(|()| ClientError::InvalidUrl {
            url: identity_url.to_string(),
            reason: "url cannot carry a port".to_string(),
        })?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

impl Session {
    /// Obtains a token and base URL, trying the credential cache first.
    pub async fn authenticate(&mut self) -> Result<(), ClientError> {
        self.authenticate_with(true).await
    }

    /// Drops the current token and logs in over the network, bypassing the
    /// cache that may have handed out the rejected token.
    pub(crate) async fn reauthenticate(&mut self) -> Result<(), ClientError> {
        self.unauthenticate();
        self.authenticate_with(false).await
    }

    async fn authenticate_with(&mut self, use_cache: bool) -> Result<(), ClientError> {
        let plugin = self.selected_plugin()?;
        let identity_url = match (self.config.identity_url.clone(), plugin.as_ref()) {
            (Some(url), _) => url,
            (None, Some(plugin)) => plugin.identity_url()?,
            (None, None) => {
                return Err(ClientError::AuthorizationFailure(
                    "authentication requires an identity URL".to_string(),
                ))
            }
        };
        let version = identity_version(&identity_url)?;
        let cache_key = self.cache_key(&identity_url);

        if self.auth_token.is_some() && self.base_url.is_some() {
            self.store_cached(&cache_key);
            return Ok(());
        }
        if use_cache && self.load_cached(&cache_key) {
            return Ok(());
        }

        if let Some(plugin) = plugin {
            self.protocol = Some(IdentityProtocol::Plugin(plugin.name().to_string()));
            self.run_plugin(plugin, identity_url.clone()).await?;
            self.apply_proxy_token(&identity_url).await?;
        } else if version == STANDARD_IDENTITY_VERSION {
            self.protocol = Some(IdentityProtocol::Standard);
            self.run_standard(identity_url.clone()).await?;
            self.apply_proxy_token(&identity_url).await?;
        } else {
            self.protocol = Some(IdentityProtocol::Legacy);
            self.run_legacy(identity_url).await?;
        }

        if let Some(bypass_url) = self.config.bypass_url.clone() {
            self.set_base_url(&bypass_url);
        }
        if self.base_url.is_none() {
            return Err(ClientError::Api(ApiError {
                kind: ApiErrorKind::Unauthorized,
                status: 401,
                method: None,
                url: None,
                request_id: None,
                message: "no service endpoint after authentication".to_string(),
                details: "n/a".to_string(),
                retry_after: None,
            }));
        }
        self.store_cached(&cache_key);
        Ok(())
    }

    fn selected_plugin(&self) -> Result<Option<Arc<dyn AuthPlugin>>, ClientError> {
        match self.config.auth_system.as_deref() {
            None | Some(DEFAULT_AUTH_SYSTEM) => Ok(None),
            Some(name) => self.registry.resolve(name).map(Some),
        }
    }

    async fn run_plugin(
        &mut self,
        plugin: Arc<dyn AuthPlugin>,
        identity_url: String,
    ) -> Result<(), ClientError> {
        let mut url = identity_url;
        let mut redirects = RedirectBudget::default();
        while let Some(next) = plugin.authenticate(self, &url).await? {
            url = redirects.follow(next)?;
        }
        Ok(())
    }

    pub(super) async fn run_standard(&mut self, identity_url: String) -> Result<(), ClientError> {
        let mut url = identity_url;
        let mut redirects = RedirectBudget::default();
        while let Some(next) = self.standard_auth(&url).await? {
            url = redirects.follow(next)?;
        }
        Ok(())
    }

    async fn run_legacy(&mut self, identity_url: String) -> Result<(), ClientError> {
        let mut url = identity_url;
        let mut redirects = RedirectBudget::default();
        loop {
            match self.legacy_auth(&url).await {
                Ok(Some(next)) => url = redirects.follow(next)?,
                Ok(None) => return Ok(()),
                // Some deployments answer the legacy handshake with a bare
                // host that only speaks the standard protocol under /v2.0.
                Err(ClientError::AuthorizationFailure(reason)) => {
                    debug!(url = %url, reason = %reason, "legacy identity failed; trying standard protocol");
                    let fallback = if url.contains(STANDARD_IDENTITY_VERSION) {
                        url
                    } else {
                        format!("{}/{}", url.trim_end_matches('/'), STANDARD_IDENTITY_VERSION)
                    };
                    self.protocol = Some(IdentityProtocol::Standard);
                    return self.run_standard(fallback).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// With a proxy token the caller's own endpoints are looked up on the
    /// admin identity endpoint, then the proxy token replaces ours.
    async fn apply_proxy_token(&mut self, identity_url: &str) -> Result<(), ClientError> {
        let Some(proxy_token) = self.config.proxy_token.clone() else {
            return Ok(());
        };
        if let Some(bypass_url) = self.config.bypass_url.clone() {
            self.set_base_url(&bypass_url);
        } else {
            let admin_url = admin_identity_url(identity_url, self.config.admin_port)?;
            self.fetch_proxy_endpoints(&admin_url, &proxy_token).await?;
        }
        self.auth_token = Some(proxy_token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_segment_is_detected() {
        assert_eq!(
            identity_version("http://identity:5000/v2.0/").expect("version"),
            "v2.0"
        );
        assert_eq!(
            identity_version("https://auth.example.com/prefix/v1.0").expect("version"),
            "v1.0"
        );
        assert_eq!(
            identity_version("https://auth.example.com/").expect("version"),
            "v1.1"
        );
        assert!(matches!(
            identity_version("not a url"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn admin_url_rewrites_port() {
        assert_eq!(
            admin_identity_url("http://identity:5000/v2.0", 35357).expect("admin"),
            "http://identity:35357/v2.0"
        );
        assert_eq!(
            admin_identity_url("https://identity/v2.0", 35357).expect("admin"),
            "https://identity:35357/v2.0"
        );
    }

    #[test]
    fn redirect_budget_is_bounded() {
        let mut budget = RedirectBudget::default();
        for _ in 0..MAX_AUTH_REDIRECTS {
            budget.follow("http://next".to_string()).expect("within budget");
        }
        assert!(matches!(
            budget.follow("http://loop".to_string()),
            Err(ClientError::TooManyRedirects { location }) if location == "http://loop"
        ));
    }
}
