use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use stratus_core::{
    classify, HEADER_AUTH_KEY, HEADER_AUTH_TOKEN, HEADER_AUTH_USER, HEADER_LOCATION,
    HEADER_MANAGEMENT_URL, HEADER_PROJECT_ID,
};

use crate::modules::session::{ClientError, Session};

impl Session {
    /// Header-based handshake: credentials go out as headers and the token
    /// and management URL come back as headers.
    pub(super) async fn legacy_auth(&mut self, url: &str) -> Result<Option<String>, ClientError> {
        if self.config.proxy_token.is_some() {
            return Err(ClientError::NoTokenLookup);
        }
        let credential = &self.config.credential;
        let (Some(user), Some(secret)) = (credential.user(), credential.secret()) else {
            return Err(ClientError::AuthorizationFailure(
                "the legacy identity protocol needs a user and a secret".to_string(),
            ));
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(HEADER_AUTH_USER),
            HeaderValue::from_str(user)?,
        );
        headers.insert(
            HeaderName::from_static(HEADER_AUTH_KEY),
            HeaderValue::from_str(secret)?,
        );
        if let Some(project_id) = self.config.project_id.as_deref() {
            headers.insert(
                HeaderName::from_static(HEADER_PROJECT_ID),
                HeaderValue::from_str(project_id)?,
            );
        }

        let response = self.send(url, Method::GET, headers, None, false).await?;
        if (200..300).contains(&response.status) {
            let (Some(base_url), Some(token)) = (
                response.header(HEADER_MANAGEMENT_URL),
                response.header(HEADER_AUTH_TOKEN),
            ) else {
                return Err(ClientError::AuthorizationFailure(
                    "identity response lacks the management URL or token header".to_string(),
                ));
            };
            self.base_url = Some(base_url.trim_end_matches('/').to_string());
            self.auth_token = Some(token.to_string());
            return Ok(None);
        }
        if response.is_redirect() {
            return response
                .header(HEADER_LOCATION)
                .map(|location| Some(location.to_string()))
                .ok_or_else(|| {
                    ClientError::AuthorizationFailure(
                        "identity redirect without a location header".to_string(),
                    )
                });
        }
        Err(classify(response.status, &response.headers, response.body.as_ref())
            .with_request(Method::GET.as_str(), url)
            .into())
    }
}
