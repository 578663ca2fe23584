//! # prefsync - settings persistence for plain structs
//!
//! A generic, framework-agnostic library that maps the registered fields
//! of a settings struct onto a key/value store, with secure-storage
//! routing and optional per-field encryption.
//!
//! ## Features
//!
//! - **Field registry**: declare once per settings type which fields are
//!   persisted, under which policy (name override, default, secure,
//!   encrypt, skip-for-export)
//! - **Canonical keys**: deterministic storage names derived from the
//!   settings type and member name, stable across runs
//! - **Secure settings**: string fields marked `.secure()` route to an
//!   OS keychain (requires the `keychain` feature) or any custom
//!   [`SecureStore`]
//! - **Encrypted settings**: `.secure().encrypt()` fields are encrypted
//!   with AES-256-GCM before they reach the secure store, with key
//!   rotation via [`SettingsManager::exchange_key`]
//! - **Import/Export**: dump all settings into a dictionary and restore
//!   them later, skip-for-export fields excluded
//! - **Backends**: JSON file store by default, in-memory stores for
//!   tests, a cloud store capability for alternate targets
//!
//! ## Quick Start
//!
//! ```rust
//! use prefsync::{settings_model, FieldPolicy, MemoryStore, SettingsManager};
//!
//! #[derive(Default)]
//! struct AppSettings {
//!     theme: String,
//!     retries: i32,
//! }
//!
//! settings_model! {
//!     AppSettings {
//!         theme: Text => FieldPolicy::text("dark"),
//!         retries: I32 => FieldPolicy::i32(3),
//!     }
//! }
//!
//! # fn main() -> prefsync::Result<()> {
//! let manager = SettingsManager::<AppSettings>::builder("my-app")
//!     .store(MemoryStore::new())
//!     .build()?;
//!
//! manager.edit(|s| s.retries = 5);
//! manager.save()?;
//! manager.reset_field("retries")?;
//! assert_eq!(manager.edit(|s| s.retries), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Secure and encrypted settings
//!
//! ```rust,no_run
//! use prefsync::{settings_model, FieldPolicy, SettingsManager};
//!
//! #[derive(Default)]
//! struct Credentials {
//!     api_token: String,
//! }
//!
//! settings_model! {
//!     Credentials {
//!         api_token: Text => FieldPolicy::text("").secure().encrypt().skip_for_export(),
//!     }
//! }
//!
//! # async fn example() -> prefsync::Result<()> {
//! let manager = SettingsManager::<Credentials>::builder("my-app")
//!     .secure_store(prefsync::MemorySecureStore::new())
//!     .build()?;
//!
//! manager.edit(|c| c.api_token = "abc123".into());
//! manager.save_async(Some("K1")).await?;
//!
//! // Rotate the encryption key
//! manager.exchange_key("K2", Some("K1"), true).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Secure fields must be strings and are only reachable through the
//! async API; a wrong rotation key surfaces as an encryption error
//! event, never as a silently wrong value.

mod engine;
mod error;
mod events;
mod manager;
mod model;
mod naming;
pub mod security;
pub mod storage;
mod value;

pub use engine::{DictEntry, ProcessOutcome, SettingsAction, SettingsDict, SettingsTarget};
pub use error::{Error, Result};
pub use events::{EncryptionErrorEvent, EventManager};
pub use manager::{SettingsManager, SettingsManagerBuilder};
pub use model::{FieldBinding, FieldPolicy, SettingsModel};
pub use naming::{full_setting_name, settings_name_prefix, FORMAT_VERSION, NAME_PREFIX};
pub use value::{coerce, SettingKind, SettingValue};

#[cfg(feature = "aead")]
pub use security::AeadCipher;
#[cfg(feature = "keychain")]
pub use security::KeychainStore;
pub use security::{MemorySecureStore, SecureStore, TextCipher};
#[cfg(feature = "json")]
pub use storage::JsonFileStore;
pub use storage::{CloudStore, MemoryCloudStore, MemoryStore, PreferenceStore};

// Macro support, not public API.
#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
