use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use stratus_core::{
    classify, EndpointFilter, ServiceCatalog, TokenRequest, DEFAULT_SERVICE_TYPE,
    HEADER_AUTH_TOKEN, HEADER_LOCATION,
};
use tracing::{debug, warn};

use super::authenticate::parse_url;
use crate::modules::session::{ApiResponse, ClientError, Credential, Session};

impl Session {
    pub(super) async fn standard_auth(&mut self, url: &str) -> Result<Option<String>, ClientError> {
        let request = match &self.config.credential {
            Credential::Password { username, password } => TokenRequest::password(username, password),
            Credential::UserId { user_id, password } => TokenRequest::user_id(user_id, password),
            Credential::Token(token) => TokenRequest::token(token),
        }
        .scoped(self.tenant_id.as_deref(), self.config.project_id.as_deref());
        self.authenticate_with_body(url, &request).await
    }

    /// Posts `request` to `<url>/tokens` and adopts the returned catalog.
    /// Returns the location to retry against when the service redirects.
    pub async fn authenticate_with_body(
        &mut self,
        url: &str,
        request: &TokenRequest,
    ) -> Result<Option<String>, ClientError> {
        let token_url = format!("{}/tokens", url.trim_end_matches('/'));
        let body = serde_json::to_value(request)?;
        let response = self
            .send(&token_url, Method::POST, HeaderMap::new(), Some(&body), true)
            .await?;
        self.extract_catalog(Method::POST, &token_url, response, true)
    }

    pub(super) async fn fetch_proxy_endpoints(
        &mut self,
        admin_url: &str,
        proxy_token: &str,
    ) -> Result<(), ClientError> {
        let mut url = parse_url(&format!(
            "{}/tokens/{}",
            admin_url.trim_end_matches('/'),
            proxy_token
        ))?;
        if let Some(tenant_id) = self.config.proxy_tenant_id.as_deref() {
            url.query_pairs_mut().append_pair("belongsTo", tenant_id);
        }
        debug!(url = %url, "fetching proxy token endpoints");

        let mut headers = HeaderMap::new();
        if let Some(token) = self.auth_token.as_deref() {
            headers.insert(
                HeaderName::from_static(HEADER_AUTH_TOKEN),
                HeaderValue::from_str(token)?,
            );
        }
        let response = self
            .send(url.as_str(), Method::GET, headers, None, false)
            .await?;
        match self.extract_catalog(Method::GET, url.as_str(), response, false)? {
            None => Ok(()),
            Some(location) => Err(ClientError::AuthorizationFailure(format!(
                "admin identity endpoint redirected to {location}"
            ))),
        }
    }

    fn extract_catalog(
        &mut self,
        method: Method,
        url: &str,
        response: ApiResponse,
        extract_token: bool,
    ) -> Result<Option<String>, ClientError> {
        match response.status {
            200 | 201 => {
                let payload = response.body.unwrap_or(Value::Null);
                let catalog = ServiceCatalog::from_payload(&payload)
                    .map_err(|err| ClientError::AuthorizationFailure(err.to_string()))?;
                let filter = self.endpoint_filter();
                let service_type = filter
                    .service_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string());
                let base_url = catalog
                    .url_for(&service_type, self.config.visibility, &filter)
                    .inspect_err(|err| warn!(service_type = %service_type, "{err}"))?;
                if extract_token {
                    self.auth_token = Some(catalog.token().id.clone());
                    if let Some(tenant_id) = catalog.token().tenant_id() {
                        self.tenant_id = Some(tenant_id.to_string());
                    }
                }
                self.base_url = Some(base_url);
                self.catalog = Some(catalog);
                Ok(None)
            }
            301 | 302 | 305 => response
                .header(HEADER_LOCATION)
                .map(|location| Some(location.to_string()))
                .ok_or_else(|| {
                    ClientError::AuthorizationFailure(
                        "identity redirect without a location header".to_string(),
                    )
                }),
            status => Err(classify(status, &response.headers, response.body.as_ref())
                .with_request(method.as_str(), url)
                .into()),
        }
    }

    fn endpoint_filter(&self) -> EndpointFilter {
        let mut filter = self.config.filter.clone();
        filter
            .service_type
            .get_or_insert_with(|| DEFAULT_SERVICE_TYPE.to_string());
        filter
    }
}
