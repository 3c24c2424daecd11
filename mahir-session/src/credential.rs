//! API credential storage.

use crate::error::Result;
use crate::store::SharedStore;
use secrecy::SecretString;

/// Fixed storage key for the Gemini API credential.
pub const API_KEY_STORAGE_KEY: &str = "gemini-api-key";

/// Reads and writes the Gemini API key in the local store.
///
/// The key is surfaced as a [`SecretString`] so it never lands in debug
/// output or logs. A blank or whitespace-only stored value counts as no
/// credential.
#[derive(Clone)]
pub struct CredentialStore {
    store: SharedStore,
}

impl CredentialStore {
    /// Create a credential store over the given backing store.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The configured API key, if any.
    pub fn api_key(&self) -> Result<Option<SecretString>> {
        let raw = self.store.get(API_KEY_STORAGE_KEY)?;
        Ok(raw
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(SecretString::from))
    }

    /// Whether a non-empty credential is configured.
    pub fn has_api_key(&self) -> Result<bool> {
        Ok(self.api_key()?.is_some())
    }

    /// Store an API key, trimming surrounding whitespace.
    pub fn set_api_key(&self, key: &str) -> Result<()> {
        self.store.set(API_KEY_STORAGE_KEY, key.trim())
    }

    /// Remove the stored credential.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(API_KEY_STORAGE_KEY)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use secrecy::ExposeSecret;
    use std::sync::Arc;

    fn credentials() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn missing_key_is_none() {
        let creds = credentials();
        assert!(creds.api_key().unwrap().is_none());
        assert!(!creds.has_api_key().unwrap());
    }

    #[test]
    fn set_and_read_back() {
        let creds = credentials();
        creds.set_api_key("  AIzaExample  ").unwrap();
        let key = creds.api_key().unwrap().unwrap();
        assert_eq!(key.expose_secret(), "AIzaExample");
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let creds = credentials();
        creds.set_api_key("   ").unwrap();
        assert!(creds.api_key().unwrap().is_none());
    }

    #[test]
    fn clear_removes_credential() {
        let creds = credentials();
        creds.set_api_key("AIzaExample").unwrap();
        creds.clear().unwrap();
        assert!(creds.api_key().unwrap().is_none());
    }
}
