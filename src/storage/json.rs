//! File-backed JSON store with an in-memory cache.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::storage::PreferenceStore;

const SETTINGS_FILE: &str = "settings.json";

/// [`PreferenceStore`] persisted as a single pretty-printed JSON file.
///
/// All reads are served from the cache; every mutation is flushed to
/// disk immediately. Keys are kept sorted so the file diffs cleanly.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    cache: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Opens the store for `app_name`, creating the config directory if
    /// needed. Without an explicit directory the platform config dir is
    /// used (e.g. `~/.config/<app_name>` on Linux).
    pub fn open(app_name: &str, config_dir: Option<&Path>) -> Result<Self> {
        let dir = match config_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Storage("no config directory available".into()))?
                .join(app_name),
        };
        fs::create_dir_all(&dir)?;
        Self::open_file(dir.join(SETTINGS_FILE))
    }

    /// Opens the store at an explicit file path.
    pub fn open_file(path: PathBuf) -> Result<Self> {
        let cache = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("Settings file not found, starting empty: {}", path.display());
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.cache)?;
        fs::write(&self.path, text)?;
        debug!("Flushed {} settings to {}", self.cache.len(), self.path.display());
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.cache.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.cache.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.cache.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.cache.clear();
        self.flush()
    }
}
