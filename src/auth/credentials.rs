//! Secure token-at-rest storage.
//!
//! `SecureStore` is the collaborator boundary through which the auth flow
//! persists the bearer token between launches. Two implementations:
//!
//! - `KeyringStore`: production storage in the OS keychain
//! - `MemoryStore`: platforms without a keychain, and tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;

/// Keychain service name for Huddle entries
const SERVICE_NAME: &str = "huddle";

pub trait SecureStore: Send + Sync {
    fn save_string(&self, key: &str, value: &str) -> Result<()>;
    fn get_string(&self, key: &str) -> Result<Option<String>>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// OS keychain storage via the `keyring` crate.
///
/// The keychain has no key enumeration, so `clear` only removes keys that
/// were written through this instance.
pub struct KeyringStore {
    service: String,
    written_keys: Mutex<HashSet<String>>,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            written_keys: Mutex::new(HashSet::new()),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureStore for KeyringStore {
    fn save_string(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store value in keychain")?;
        self.written_keys
            .lock()
            .expect("keyring key set lock poisoned")
            .insert(key.to_string());
        Ok(())
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read value from keychain"),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                self.written_keys
                    .lock()
                    .expect("keyring key set lock poisoned")
                    .remove(key);
                Ok(())
            }
            Err(e) => Err(e).context("Failed to delete value from keychain"),
        }
    }

    fn clear(&self) -> Result<()> {
        let keys: Vec<String> = self
            .written_keys
            .lock()
            .expect("keyring key set lock poisoned")
            .iter()
            .cloned()
            .collect();
        for key in keys {
            self.remove(&key)?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and platforms without a keychain.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStore for MemoryStore {
    fn save_string(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .expect("memory store lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .lock()
            .expect("memory store lock poisoned")
            .get(key)
            .cloned())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .expect("memory store lock poisoned")
            .remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values
            .lock()
            .expect("memory store lock poisoned")
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_string("token").unwrap(), None);

        store.save_string("token", "abc").unwrap();
        assert_eq!(store.get_string("token").unwrap().as_deref(), Some("abc"));

        store.save_string("token", "def").unwrap();
        assert_eq!(store.get_string("token").unwrap().as_deref(), Some("def"));
    }

    #[test]
    fn test_memory_store_remove_is_idempotent() {
        let store = MemoryStore::new();
        store.save_string("token", "abc").unwrap();

        store.remove("token").unwrap();
        assert_eq!(store.get_string("token").unwrap(), None);

        // Removing a missing key succeeds
        store.remove("token").unwrap();
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemoryStore::new();
        store.save_string("a", "1").unwrap();
        store.save_string("b", "2").unwrap();

        store.clear().unwrap();
        assert_eq!(store.get_string("a").unwrap(), None);
        assert_eq!(store.get_string("b").unwrap(), None);
    }
}
