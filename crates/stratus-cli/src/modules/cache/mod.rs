mod keychain;
#[cfg(test)]
mod memory;

pub(crate) use keychain::{KeyringCache, KEYRING_SERVICE};
#[cfg(test)]
pub(crate) use memory::MemoryCache;

const VALUE_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAuth {
    pub token: String,
    pub base_url: String,
}

impl CachedAuth {
    pub fn encode(&self) -> String {
        format!("{}{VALUE_SEPARATOR}{}", self.token, self.base_url)
    }

    pub fn decode(value: &str) -> Option<Self> {
        let (token, base_url) = value.split_once(VALUE_SEPARATOR)?;
        if token.is_empty() || base_url.is_empty() {
            return None;
        }
        Some(Self {
            token: token.to_string(),
            base_url: base_url.to_string(),
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("credential cache unavailable: {0}")]
    Unavailable(String),
    #[error("malformed credential cache entry for {key}")]
    Malformed { key: String },
}

/// Persistent token store shared with other processes. Callers treat every
/// failure as a miss.
pub trait CredentialCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CachedAuth>, CacheError>;
    fn set(&self, key: &str, value: &CachedAuth) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_value_splits_on_first_separator() {
        let cached = CachedAuth {
            token: "tok".into(),
            base_url: "http://compute/v2|x".into(),
        };
        assert_eq!(cached.encode(), "tok|http://compute/v2|x");
        assert_eq!(CachedAuth::decode(&cached.encode()), Some(cached));
        assert_eq!(CachedAuth::decode("no-separator"), None);
        assert_eq!(CachedAuth::decode("|http://x"), None);
    }
}
