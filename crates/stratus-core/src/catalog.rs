use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::{
    CATALOG_KEY, DEFAULT_SERVICE_TYPE, SUPPORTED_COMPUTE_VERSIONS, TOKEN_KEY, VOLUME_SERVICE_TYPE,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("service catalog payload must be a JSON object")]
    Malformed,
    #[error("service catalog carries no token id")]
    MissingToken,
    #[error("could not find a suitable endpoint in '{collection}'; correct region?")]
    EndpointNotFound { collection: String },
    #[error(
        "found {} endpoints in '{collection}'; add a more restrictive filter",
        .urls.len()
    )]
    AmbiguousEndpoints { collection: String, urls: Vec<String> },
}

/// Which URL variant of an endpoint to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Admin,
}

impl Visibility {
    pub fn url_key(self) -> &'static str {
        match self {
            Visibility::Public => "publicURL",
            Visibility::Internal => "internalURL",
            Visibility::Admin => "adminURL",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Admin => "admin",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" | "publicurl" => Ok(Visibility::Public),
            "internal" | "internalurl" => Ok(Visibility::Internal),
            "admin" | "adminurl" => Ok(Visibility::Admin),
            other => Err(format!("unknown endpoint visibility: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TenantRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(default)]
    pub tenant: Option<TenantRef>,
    #[serde(default)]
    pub expires: Option<String>,
}

impl Token {
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant.as_ref().and_then(|tenant| tenant.id.as_deref())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires
            .as_deref()
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, rename = "type", alias = "serviceType")]
    pub service_type: Option<String>,
    #[serde(default, rename = "name", alias = "serviceName")]
    pub service_name: Option<String>,
    #[serde(default, rename = "versionId")]
    pub version_id: Option<String>,
    #[serde(default, rename = "publicURL")]
    pub public_url: Option<String>,
    #[serde(default, rename = "internalURL")]
    pub internal_url: Option<String>,
    #[serde(default, rename = "adminURL")]
    pub admin_url: Option<String>,
}

impl Endpoint {
    pub fn url(&self, visibility: Visibility) -> Option<&str> {
        match visibility {
            Visibility::Public => self.public_url.as_deref(),
            Visibility::Internal => self.internal_url.as_deref(),
            Visibility::Admin => self.admin_url.as_deref(),
        }
    }

    fn is_unsupported_compute(&self) -> bool {
        self.service_type.as_deref() == Some(DEFAULT_SERVICE_TYPE)
            && self
                .version_id
                .as_deref()
                .is_some_and(|version| !SUPPORTED_COMPUTE_VERSIONS.contains(&version))
    }
}

/// Endpoint attributes a lookup must match. Unset fields match anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndpointFilter {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    /// Service name of non-volume endpoints.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Service name of volume endpoints.
    #[serde(default)]
    pub secondary_service_name: Option<String>,
}

impl EndpointFilter {
    pub fn is_empty(&self) -> bool {
        self.region.is_none()
            && self.service_type.is_none()
            && self.service_name.is_none()
            && self.secondary_service_name.is_none()
    }

    pub fn matches(&self, endpoint: &Endpoint) -> bool {
        let is_volume = endpoint.service_type.as_deref() == Some(VOLUME_SERVICE_TYPE);
        let name_filter = if is_volume {
            self.secondary_service_name.as_deref()
        } else {
            self.service_name.as_deref()
        };
        attribute_matches(self.region.as_deref(), endpoint.region.as_deref(), true)
            && attribute_matches(
                self.service_type.as_deref(),
                endpoint.service_type.as_deref(),
                false,
            )
            && attribute_matches(name_filter, endpoint.service_name.as_deref(), false)
    }
}

fn attribute_matches(wanted: Option<&str>, actual: Option<&str>, ignore_case: bool) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(wanted), Some(actual)) if ignore_case => wanted.eq_ignore_ascii_case(actual),
        (Some(wanted), Some(actual)) => wanted == actual,
    }
}

/// Token and endpoints returned by a successful authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCatalog {
    token: Token,
    attributes: Map<String, Value>,
    collections: BTreeMap<String, Vec<Endpoint>>,
}

impl ServiceCatalog {
    pub fn from_payload(payload: &Value) -> Result<Self, CatalogError> {
        let Value::Object(root) = payload else {
            return Err(CatalogError::Malformed);
        };
        let mut attributes = Map::new();
        let mut collections = BTreeMap::new();
        collect_entries(root, &mut attributes, &mut collections);

        let token = attributes
            .remove(TOKEN_KEY)
            .and_then(|value| serde_json::from_value::<Token>(value).ok())
            .ok_or(CatalogError::MissingToken)?;

        Ok(Self {
            token,
            attributes,
            collections,
        })
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn collection(&self, name: &str) -> Option<&[Endpoint]> {
        self.collections.get(name).map(Vec::as_slice)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn url_for(
        &self,
        collection: &str,
        visibility: Visibility,
        filter: &EndpointFilter,
    ) -> Result<String, CatalogError> {
        let not_found = || CatalogError::EndpointNotFound {
            collection: collection.to_string(),
        };
        let endpoints = self.collection(collection).ok_or_else(not_found)?;
        let candidates: Vec<&Endpoint> = endpoints
            .iter()
            .filter(|endpoint| !endpoint.is_unsupported_compute())
            .filter(|endpoint| filter.matches(endpoint))
            .collect();

        let chosen = match candidates.as_slice() {
            [] => return Err(not_found()),
            [only] => *only,
            [first, ..] if filter.is_empty() => *first,
            many => {
                return Err(CatalogError::AmbiguousEndpoints {
                    collection: collection.to_string(),
                    urls: many
                        .iter()
                        .filter_map(|endpoint| endpoint.url(visibility))
                        .map(str::to_string)
                        .collect(),
                })
            }
        };
        chosen
            .url(visibility)
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(not_found)
    }
}

fn collect_entries(
    entries: &Map<String, Value>,
    attributes: &mut Map<String, Value>,
    collections: &mut BTreeMap<String, Vec<Endpoint>>,
) {
    for (key, value) in entries {
        if key == CATALOG_KEY {
            collect_services(value, collections);
            continue;
        }
        match value {
            Value::Object(inner) if inner.contains_key(CATALOG_KEY) || inner.contains_key(TOKEN_KEY) => {
                collect_entries(inner, attributes, collections);
            }
            _ => {
                attributes.insert(key.clone(), value.clone());
            }
        }
    }
}

fn collect_services(value: &Value, collections: &mut BTreeMap<String, Vec<Endpoint>>) {
    match value {
        Value::Object(families) => {
            for (name, records) in families {
                match endpoint_list(records, None, None) {
                    Some(endpoints) => collections.entry(name.clone()).or_default().extend(endpoints),
                    None => debug!(collection = %name, "ignoring unrecognized catalog entry"),
                }
            }
        }
        Value::Array(services) => {
            for service in services {
                let Some(service_type) = service.get("type").and_then(Value::as_str) else {
                    debug!("ignoring catalog service without a type");
                    continue;
                };
                let service_name = service.get("name").and_then(Value::as_str);
                let endpoints = service
                    .get("endpoints")
                    .and_then(|records| endpoint_list(records, Some(service_type), service_name));
                match endpoints {
                    Some(endpoints) => collections
                        .entry(service_type.to_string())
                        .or_default()
                        .extend(endpoints),
                    None => debug!(service_type = %service_type, "ignoring unrecognized catalog service"),
                }
            }
        }
        _ => debug!("ignoring service catalog that is neither a map nor a list"),
    }
}

fn endpoint_list(
    records: &Value,
    service_type: Option<&str>,
    service_name: Option<&str>,
) -> Option<Vec<Endpoint>> {
    let Value::Array(records) = records else {
        return None;
    };
    if !records.is_empty() && !records.iter().any(Value::is_object) {
        return None;
    }
    let endpoints = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            if !record.is_object() {
                debug!(index, "skipping endpoint record that is not an object");
                return None;
            }
            let mut endpoint = match serde_json::from_value::<Endpoint>(record.clone()) {
                Ok(endpoint) => endpoint,
                Err(err) => {
                    debug!(index, "skipping unreadable endpoint record: {err}");
                    return None;
                }
            };
            if let Some(service_type) = service_type {
                endpoint.service_type = Some(service_type.to_string());
            }
            if let Some(service_name) = service_name {
                endpoint.service_name = Some(service_name.to_string());
            }
            Some(endpoint)
        })
        .collect();
    Some(endpoints)
}
