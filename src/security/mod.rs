//! Secure storage and encryption capabilities.
//!
//! Secure storage holds strings only and is reachable exclusively
//! through the async API. The cipher is an opaque primitive; the engine
//! only cares that decryption fails loudly on a key mismatch.

pub mod cipher;
#[cfg(feature = "keychain")]
mod keychain;
mod memory;

pub use cipher::TextCipher;
#[cfg(feature = "aead")]
pub use cipher::AeadCipher;
#[cfg(feature = "keychain")]
pub use keychain::KeychainStore;
pub use memory::MemorySecureStore;

use async_trait::async_trait;

use crate::error::Result;

/// Async secure key/value store, restricted to strings.
///
/// A missing key reads as `None`; removing a missing key is a no-op.
/// The engine routes empty-string writes to [`remove`](Self::remove), so
/// implementations never see an empty value.
#[async_trait]
pub trait SecureStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn remove_all(&self) -> Result<()>;
}

#[async_trait]
impl<S: SecureStore + ?Sized> SecureStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }

    async fn remove_all(&self) -> Result<()> {
        (**self).remove_all().await
    }
}
