use super::{CacheError, CachedAuth, CredentialCache};

pub(crate) const KEYRING_SERVICE: &str = "stratus-auth";

/// Cache backed by the OS keychain.
#[derive(Debug, Clone)]
pub struct KeyringCache {
    service: String,
}

impl KeyringCache {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, CacheError> {
        keyring::Entry::new(&self.service, key)
            .map_err(|err| CacheError::Unavailable(format!("failed to access keyring: {err}")))
    }
}

impl CredentialCache for KeyringCache {
    fn get(&self, key: &str) -> Result<Option<CachedAuth>, CacheError> {
        match self.entry(key)?.get_password() {
            Ok(value) => CachedAuth::decode(&value).map(Some).ok_or_else(|| {
                CacheError::Malformed {
                    key: key.to_string(),
                }
            }),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(CacheError::Unavailable(err.to_string())),
        }
    }

    fn set(&self, key: &str, value: &CachedAuth) -> Result<(), CacheError> {
        self.entry(key)?
            .set_password(&value.encode())
            .map_err(|err| CacheError::Unavailable(format!("failed to store token: {err}")))
    }
}
