use serde::{Deserialize, Serialize};

/// Body of `POST <identity>/tokens`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRequest {
    pub auth: AuthBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthBody {
    #[serde(
        rename = "passwordCredentials",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub password_credentials: Option<PasswordCredentials>,
    #[serde(
        rename = "apiKeyCredentials",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key_credentials: Option<ApiKeyCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenCredential>,
    #[serde(rename = "tenantId", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(rename = "tenantName", default, skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKeyCredentials {
    pub username: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCredential {
    pub id: String,
}

impl TokenRequest {
    pub fn password(username: &str, password: &str) -> Self {
        Self::from_body(AuthBody {
            password_credentials: Some(PasswordCredentials {
                username: Some(username.to_string()),
                user_id: None,
                password: password.to_string(),
            }),
            ..AuthBody::default()
        })
    }

    pub fn user_id(user_id: &str, password: &str) -> Self {
        Self::from_body(AuthBody {
            password_credentials: Some(PasswordCredentials {
                username: None,
                user_id: Some(user_id.to_string()),
                password: password.to_string(),
            }),
            ..AuthBody::default()
        })
    }

    pub fn token(id: &str) -> Self {
        Self::from_body(AuthBody {
            token: Some(TokenCredential { id: id.to_string() }),
            ..AuthBody::default()
        })
    }

    pub fn api_key(username: &str, api_key: &str) -> Self {
        Self::from_body(AuthBody {
            api_key_credentials: Some(ApiKeyCredentials {
                username: username.to_string(),
                api_key: api_key.to_string(),
            }),
            ..AuthBody::default()
        })
    }

    /// Scopes the request; a tenant id takes precedence over a tenant name.
    pub fn scoped(mut self, tenant_id: Option<&str>, tenant_name: Option<&str>) -> Self {
        if let Some(tenant_id) = tenant_id {
            self.auth.tenant_id = Some(tenant_id.to_string());
        } else if let Some(tenant_name) = tenant_name {
            self.auth.tenant_name = Some(tenant_name.to_string());
        }
        self
    }

    fn from_body(auth: AuthBody) -> Self {
        Self { auth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn password_body_matches_wire_format() {
        let body = serde_json::to_value(TokenRequest::password("user", "secret").scoped(None, Some("demo")))
            .expect("serialize");
        assert_eq!(
            body,
            json!({
                "auth": {
                    "passwordCredentials": {"username": "user", "password": "secret"},
                    "tenantName": "demo"
                }
            })
        );
    }

    #[test]
    fn tenant_id_wins_over_name() {
        let body = serde_json::to_value(TokenRequest::token("tok").scoped(Some("t-1"), Some("demo")))
            .expect("serialize");
        assert_eq!(body, json!({"auth": {"token": {"id": "tok"}, "tenantId": "t-1"}}));
    }

    #[test]
    fn api_key_body_uses_extension_key() {
        let body = serde_json::to_value(TokenRequest::api_key("user", "key")).expect("serialize");
        assert_eq!(
            body,
            json!({"auth": {"apiKeyCredentials": {"username": "user", "apiKey": "key"}}})
        );
    }
}
