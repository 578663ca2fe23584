//! Plaintext storage capabilities.
//!
//! The engine treats storage as an opaque key/value capability. The
//! local store works on raw `serde_json::Value`s; the optional cloud
//! store is a separate capability selected through
//! [`SettingsTarget::Cloud`](crate::SettingsTarget) and never receives
//! secure members.

#[cfg(feature = "json")]
mod json;
mod memory;

#[cfg(feature = "json")]
pub use json::JsonFileStore;
pub use memory::{MemoryCloudStore, MemoryStore};

use serde_json::Value;

use crate::error::Result;

/// Local plaintext key/value store.
///
/// `get` misses resolve to `None`; the coercion layer applies the policy
/// default. Mutations are fallible and their faults propagate unchanged.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Alternate cloud key/value store. Optional capability; secure members
/// are never routed here.
pub trait CloudStore: Send {
    fn get_value(&self, key: &str) -> Option<Value>;
    fn set_value(&mut self, key: &str, value: Value) -> Result<()>;
    fn delete_value(&mut self, key: &str) -> Result<()>;
}
