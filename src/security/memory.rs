//! In-memory secure store for tests and platforms without a keychain.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::Result;
use crate::security::SecureStore;

/// Volatile [`SecureStore`]. Values are kept in process memory only.
#[derive(Debug, Default)]
pub struct MemorySecureStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raw stored form, ciphertext included. Test helper.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    async fn remove_all(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemorySecureStore::new();
        store.set("token", "abc").await.expect("set");
        assert_eq!(store.get("token").await.expect("get"), Some("abc".into()));

        store.remove("token").await.expect("remove");
        assert_eq!(store.get("token").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let store = MemorySecureStore::new();
        store.remove("absent").await.expect("remove");
    }
}
