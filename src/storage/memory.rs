//! In-memory stores for tests and embedding.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Result;
use crate::storage::{CloudStore, PreferenceStore};

/// Volatile [`PreferenceStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.values.clear();
        Ok(())
    }
}

/// Volatile [`CloudStore`] reference implementation.
#[derive(Debug, Default)]
pub struct MemoryCloudStore {
    values: HashMap<String, Value>,
}

impl MemoryCloudStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CloudStore for MemoryCloudStore {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn delete_value(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}
