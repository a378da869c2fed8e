use std::collections::HashMap;
use std::sync::Mutex;

use super::{CacheError, CachedAuth, CredentialCache};

/// In-process stand-in for the keychain.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}

impl CredentialCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CachedAuth>, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("failed to lock memory cache".to_string()))?;
        match entries.get(key) {
            Some(value) => CachedAuth::decode(value)
                .map(Some)
                .ok_or_else(|| CacheError::Malformed {
                    key: key.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &CachedAuth) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("failed to lock memory cache".to_string()))?;
        entries.insert(key.to_string(), value.encode());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("k").expect("get"), None);
        let value = CachedAuth {
            token: "tok".into(),
            base_url: "http://compute".into(),
        };
        cache.set("k", &value).expect("set");
        assert_eq!(cache.get("k").expect("get"), Some(value));
        assert_eq!(cache.len(), 1);
    }
}
