//! OS keychain backed secure store.

use async_trait::async_trait;
use keyring::{Entry, Error as KeyringError};
use log::{debug, error, warn};

use crate::error::{Error, Result};
use crate::security::SecureStore;

/// [`SecureStore`] backed by the platform keyring (Secret Service,
/// Windows Credential Manager or the macOS keychain).
///
/// Keyring operations are synchronous and fast; they are surfaced
/// through the async trait so secure and encrypted fields share one
/// code path. `remove_all` is not supported by the platform APIs and
/// returns an error.
#[derive(Debug, Clone)]
pub struct KeychainStore {
    service_name: String,
}

impl KeychainStore {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service_name, key).map_err(|e| {
            error!("Failed to create keyring entry for '{key}': {e}");
            Error::Keyring(e.to_string())
        })
    }
}

#[async_trait]
impl SecureStore for KeychainStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(e) => {
                warn!("Failed to read keyring entry '{key}': {e}");
                Err(Error::Keyring(e.to_string()))
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| Error::Keyring(e.to_string()))?;
        debug!("Stored secure setting '{key}' in system keyring");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(KeyringError::NoEntry) => {
                debug!("Keyring entry '{key}' not found (already removed)");
                Ok(())
            }
            Err(e) => {
                error!("Failed to remove keyring entry '{key}': {e}");
                Err(Error::Keyring(e.to_string()))
            }
        }
    }

    async fn remove_all(&self) -> Result<()> {
        Err(Error::Keyring(
            "the platform keyring cannot enumerate entries; remove keys individually".into(),
        ))
    }
}
