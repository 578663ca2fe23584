//! The settings manager facade.
//!
//! One `SettingsManager` is the explicit context object for one settings
//! type: it owns the single settings instance, the storage capabilities
//! and the event registry. Construct it once per application through
//! [`SettingsManager::builder`] and share it; every load, save, delete
//! and reset mutates the owned instance in place.
//!
//! Locking: the synchronous walk holds the settings lock for the whole
//! walk. The asynchronous walk locks per field and never holds a guard
//! across an await point; callers that need strict ordering between
//! concurrent async operations must add their own gate.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};
use serde_json::Value;

use crate::engine::{
    DictEntry, ProcessOutcome, SettingsAction, SettingsDict, SettingsTarget, WalkOptions,
};
use crate::error::{Error, Result};
use crate::events::{EncryptionErrorEvent, EventManager};
use crate::model::{FieldBinding, SettingsModel};
use crate::naming::{full_setting_name, short_type_name};
use crate::security::{SecureStore, TextCipher};
use crate::storage::{CloudStore, PreferenceStore};

pub struct SettingsManager<M: SettingsModel> {
    pub(crate) owner: &'static str,
    pub(crate) settings: Mutex<M>,
    pub(crate) store: Mutex<Box<dyn PreferenceStore>>,
    pub(crate) secure: Option<Box<dyn SecureStore>>,
    pub(crate) cloud: Option<Mutex<Box<dyn CloudStore>>>,
    pub(crate) cipher_impl: Option<Box<dyn TextCipher>>,
    pub(crate) events: EventManager,
}

impl<M: SettingsModel> SettingsManager<M> {
    pub fn builder(app_name: &str) -> SettingsManagerBuilder<M> {
        SettingsManagerBuilder {
            app_name: app_name.to_string(),
            config_dir: None,
            store: None,
            secure: None,
            cloud: None,
            cipher: None,
            initial: None,
        }
    }

    // ---- shared capability access -------------------------------------

    pub(crate) fn lock_settings(&self) -> MutexGuard<'_, M> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_store(&self) -> MutexGuard<'_, Box<dyn PreferenceStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn store_get(&self, key: &str) -> Option<Value> {
        self.lock_store().get(key)
    }

    pub(crate) fn store_set(&self, key: &str, value: Value) -> Result<()> {
        self.lock_store().set(key, value)
    }

    pub(crate) fn cloud_get(&self, key: &str) -> Result<Option<Value>> {
        let cloud = self.cloud.as_ref().ok_or(Error::CloudUnavailable)?;
        Ok(cloud.lock().unwrap_or_else(PoisonError::into_inner).get_value(key))
    }

    pub(crate) fn cloud_set(&self, key: &str, value: Value) -> Result<()> {
        let cloud = self.cloud.as_ref().ok_or(Error::CloudUnavailable)?;
        cloud
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_value(key, value)
    }

    pub(crate) fn cloud_delete(&self, key: &str) -> Result<()> {
        let cloud = self.cloud.as_ref().ok_or(Error::CloudUnavailable)?;
        cloud
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .delete_value(key)
    }

    pub(crate) fn secure_store(&self) -> Result<&dyn SecureStore> {
        self.secure.as_deref().ok_or(Error::SecureUnavailable)
    }

    pub(crate) fn cipher(&self) -> Result<&dyn TextCipher> {
        self.cipher_impl.as_deref().ok_or(Error::CipherUnavailable)
    }

    /// Secure stores hold no empty strings; writing one removes the key.
    pub(crate) async fn secure_set(&self, key: &str, value: &str) -> Result<()> {
        let store = self.secure_store()?;
        if value.is_empty() {
            store.remove(key).await
        } else {
            store.set(key, value).await
        }
    }

    pub(crate) fn read_field(&self, binding: &FieldBinding<M>) -> crate::SettingValue {
        binding.value_of(&self.lock_settings())
    }

    pub(crate) fn write_field(&self, binding: &FieldBinding<M>, value: crate::SettingValue) {
        binding.apply(&mut self.lock_settings(), value)
    }

    // ---- walk drivers -------------------------------------------------

    fn find_binding(field: &str) -> Result<FieldBinding<M>> {
        M::bindings()
            .into_iter()
            .find(|binding| binding.name == field)
            .ok_or_else(|| Error::UnknownField(field.to_string()))
    }

    fn class_walk_sync(&self, action: SettingsAction, target: SettingsTarget) -> Result<()> {
        let bindings = M::bindings();
        let mut settings = self.lock_settings();
        for binding in &bindings {
            self.process_field_sync(&mut settings, binding, action, target)?;
        }
        Ok(())
    }

    async fn class_walk_async(&self, action: SettingsAction, opts: WalkOptions<'_>) -> Result<bool> {
        for binding in &M::bindings() {
            let outcome = self.process_field_async(binding, action, opts, None).await?;
            if matches!(
                outcome,
                ProcessOutcome::EncryptionError | ProcessOutcome::Failed
            ) {
                warn!("{:?} walk aborted for {} at '{}'", action, self.owner, binding.name);
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn field_walk_sync(
        &self,
        field: &str,
        action: SettingsAction,
        target: SettingsTarget,
    ) -> Result<()> {
        let binding = Self::find_binding(field)?;
        let mut settings = self.lock_settings();
        self.process_field_sync(&mut settings, &binding, action, target)?;
        Ok(())
    }

    async fn field_walk_async(
        &self,
        field: &str,
        action: SettingsAction,
        opts: WalkOptions<'_>,
    ) -> Result<bool> {
        let binding = Self::find_binding(field)?;
        let outcome = self.process_field_async(&binding, action, opts, None).await?;
        Ok(!matches!(
            outcome,
            ProcessOutcome::EncryptionError | ProcessOutcome::Failed
        ))
    }

    /// Merges an externally supplied dictionary into the field walk.
    /// A dictionary key matches a field when it equals the field's
    /// canonical key or ends with its member name; matched fields load
    /// the supplied value instead of fetching from the backend.
    async fn dictionary_walk_async(
        &self,
        dictionary: &SettingsDict,
        opts: WalkOptions<'_>,
    ) -> Result<bool> {
        for binding in &M::bindings() {
            let canonical = full_setting_name(self.owner, binding.name, &binding.policy);
            let supplied = dictionary
                .iter()
                .find(|(key, _)| **key == canonical || key.ends_with(binding.name))
                .map(|(_, entry)| &entry.value);
            let mut field_opts = opts;
            field_opts.use_supplied_value = supplied.is_some();
            let outcome = self
                .process_field_async(binding, SettingsAction::Load, field_opts, supplied)
                .await?;
            if matches!(
                outcome,
                ProcessOutcome::EncryptionError | ProcessOutcome::Failed
            ) {
                warn!("Dictionary import aborted for {} at '{}'", self.owner, binding.name);
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ---- synchronous surface ------------------------------------------

    /// Loads every registered field from the local store onto the
    /// settings object. Secure fields require [`load_async`](Self::load_async).
    pub fn load(&self) -> Result<()> {
        self.load_with(SettingsTarget::Local)
    }

    pub fn load_with(&self, target: SettingsTarget) -> Result<()> {
        self.class_walk_sync(SettingsAction::Load, target)?;
        info!("✅ Settings loaded for {}", self.owner);
        Ok(())
    }

    /// Saves every registered field to the local store.
    pub fn save(&self) -> Result<()> {
        self.save_with(SettingsTarget::Local)
    }

    pub fn save_with(&self, target: SettingsTarget) -> Result<()> {
        self.class_walk_sync(SettingsAction::Save, target)?;
        info!("✅ Settings saved for {}", self.owner);
        Ok(())
    }

    /// Resets every field to its policy default and writes the defaults
    /// back to the store. The key itself is never removed locally.
    pub fn delete(&self) -> Result<()> {
        self.delete_with(SettingsTarget::Local)
    }

    pub fn delete_with(&self, target: SettingsTarget) -> Result<()> {
        self.class_walk_sync(SettingsAction::Delete, target)
    }

    /// User-invoked reset; same backend effect as [`delete`](Self::delete).
    pub fn reset(&self) -> Result<()> {
        self.reset_with(SettingsTarget::Local)
    }

    pub fn reset_with(&self, target: SettingsTarget) -> Result<()> {
        self.class_walk_sync(SettingsAction::Reset, target)
    }

    pub fn load_field(&self, field: &str) -> Result<()> {
        self.field_walk_sync(field, SettingsAction::Load, SettingsTarget::Local)
    }

    pub fn save_field(&self, field: &str) -> Result<()> {
        self.field_walk_sync(field, SettingsAction::Save, SettingsTarget::Local)
    }

    pub fn delete_field(&self, field: &str) -> Result<()> {
        self.field_walk_sync(field, SettingsAction::Delete, SettingsTarget::Local)
    }

    pub fn reset_field(&self, field: &str) -> Result<()> {
        self.field_walk_sync(field, SettingsAction::Reset, SettingsTarget::Local)
    }

    // ---- asynchronous surface -----------------------------------------

    /// Loads every registered field, secure and encrypted ones included.
    /// `key` is the rotation key for encrypted fields. Returns `false`
    /// when an encryption fault aborted the walk.
    pub async fn load_async(&self, key: Option<&str>) -> Result<bool> {
        let ok = self
            .class_walk_async(
                SettingsAction::Load,
                WalkOptions {
                    key,
                    ..WalkOptions::default()
                },
            )
            .await?;
        if ok {
            info!("✅ Settings loaded for {}", self.owner);
        }
        Ok(ok)
    }

    /// Runs the full load pipeline, decryption included, without
    /// mutating the settings object. Validates a key before committing.
    pub async fn try_load_async(&self, key: Option<&str>) -> Result<bool> {
        self.class_walk_async(
            SettingsAction::Load,
            WalkOptions {
                key,
                try_load: true,
                ..WalkOptions::default()
            },
        )
        .await
    }

    /// Loads only the secure subset; plaintext members are skipped and
    /// their in-memory values stay untouched.
    pub async fn load_secure_async(&self, key: Option<&str>) -> Result<bool> {
        self.class_walk_async(
            SettingsAction::Load,
            WalkOptions {
                key,
                secure_only: true,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn save_async(&self, key: Option<&str>) -> Result<bool> {
        let ok = self
            .class_walk_async(
                SettingsAction::Save,
                WalkOptions {
                    key,
                    ..WalkOptions::default()
                },
            )
            .await?;
        if ok {
            info!("✅ Settings saved for {}", self.owner);
        }
        Ok(ok)
    }

    /// Saves only the secure subset.
    pub async fn save_secure_async(&self, key: Option<&str>) -> Result<bool> {
        self.class_walk_async(
            SettingsAction::Save,
            WalkOptions {
                key,
                secure_only: true,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn delete_async(&self, key: Option<&str>) -> Result<bool> {
        self.class_walk_async(
            SettingsAction::Delete,
            WalkOptions {
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn reset_async(&self, key: Option<&str>) -> Result<bool> {
        self.class_walk_async(
            SettingsAction::Reset,
            WalkOptions {
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    /// Target-selecting async variants. Secure members are rejected for
    /// any target other than [`SettingsTarget::Local`].
    pub async fn load_with_async(&self, target: SettingsTarget, key: Option<&str>) -> Result<bool> {
        self.class_walk_async(
            SettingsAction::Load,
            WalkOptions {
                target,
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn save_with_async(&self, target: SettingsTarget, key: Option<&str>) -> Result<bool> {
        self.class_walk_async(
            SettingsAction::Save,
            WalkOptions {
                target,
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn delete_with_async(
        &self,
        target: SettingsTarget,
        key: Option<&str>,
    ) -> Result<bool> {
        self.class_walk_async(
            SettingsAction::Delete,
            WalkOptions {
                target,
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn reset_with_async(&self, target: SettingsTarget, key: Option<&str>) -> Result<bool> {
        self.class_walk_async(
            SettingsAction::Reset,
            WalkOptions {
                target,
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn load_field_async(&self, field: &str, key: Option<&str>) -> Result<bool> {
        self.field_walk_async(
            field,
            SettingsAction::Load,
            WalkOptions {
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn load_secure_field_async(&self, field: &str, key: Option<&str>) -> Result<bool> {
        self.field_walk_async(
            field,
            SettingsAction::Load,
            WalkOptions {
                key,
                secure_only: true,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn save_field_async(&self, field: &str, key: Option<&str>) -> Result<bool> {
        self.field_walk_async(
            field,
            SettingsAction::Save,
            WalkOptions {
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn delete_field_async(&self, field: &str, key: Option<&str>) -> Result<bool> {
        self.field_walk_async(
            field,
            SettingsAction::Delete,
            WalkOptions {
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    pub async fn reset_field_async(&self, field: &str, key: Option<&str>) -> Result<bool> {
        self.field_walk_async(
            field,
            SettingsAction::Reset,
            WalkOptions {
                key,
                ..WalkOptions::default()
            },
        )
        .await
    }

    // ---- dictionary import and export ---------------------------------

    /// Restores settings from an exported dictionary, then saves the
    /// merged result when `save_after` is set.
    pub async fn import_dictionary(
        &self,
        dictionary: &SettingsDict,
        save_after: bool,
        key: Option<&str>,
    ) -> Result<bool> {
        let ok = self
            .dictionary_walk_async(
                dictionary,
                WalkOptions {
                    key,
                    ..WalkOptions::default()
                },
            )
            .await?;
        if ok && save_after {
            return self.save_async(key).await;
        }
        Ok(ok)
    }

    /// Dictionary dry run: full merge pipeline, no mutation, no save.
    pub async fn try_import_dictionary(
        &self,
        dictionary: &SettingsDict,
        key: Option<&str>,
    ) -> Result<bool> {
        self.dictionary_walk_async(
            dictionary,
            WalkOptions {
                key,
                try_load: true,
                ..WalkOptions::default()
            },
        )
        .await
    }

    /// Single-entry variant of [`import_dictionary`](Self::import_dictionary).
    pub async fn import_entry(
        &self,
        setting_key: &str,
        entry: DictEntry,
        save_after: bool,
        key: Option<&str>,
    ) -> Result<bool> {
        let mut dictionary = SettingsDict::new();
        dictionary.insert(setting_key.to_string(), entry);
        self.import_dictionary(&dictionary, save_after, key).await
    }

    /// Exports all registered fields as a key to (value, kind) mapping.
    /// Encrypted members stay encrypted; members flagged skip-for-export
    /// are left out.
    pub async fn export(&self) -> Result<SettingsDict> {
        self.export_with(false, None).await
    }

    pub async fn export_with(&self, secure_only: bool, key: Option<&str>) -> Result<SettingsDict> {
        let opts = WalkOptions {
            secure_only,
            keep_encrypted: true,
            key,
            ..WalkOptions::default()
        };
        let mut exported = SettingsDict::new();
        for binding in &M::bindings() {
            if binding.policy.skip_for_export {
                continue;
            }
            if let Some((setting_key, entry)) = self.process_field_kv(binding, opts).await? {
                exported.insert(setting_key, entry);
            }
        }
        Ok(exported)
    }

    /// Exports a single field as a (key, entry) tuple.
    pub async fn export_field(&self, field: &str) -> Result<(String, DictEntry)> {
        let binding = Self::find_binding(field)?;
        let opts = WalkOptions {
            keep_encrypted: true,
            ..WalkOptions::default()
        };
        self.process_field_kv(&binding, opts)
            .await?
            .ok_or_else(|| Error::Cipher(format!("could not export field '{field}'")))
    }

    // ---- key rotation -------------------------------------------------

    /// Re-encrypts all encrypted fields under `new_key`. With
    /// `reload_first` the secure subset is loaded under `old_key` first,
    /// so values currently persisted under the old key survive the
    /// rotation.
    pub async fn exchange_key(
        &self,
        new_key: &str,
        old_key: Option<&str>,
        reload_first: bool,
    ) -> Result<bool> {
        if new_key.is_empty() {
            return Err(Error::MissingEncryptionKey);
        }
        if reload_first && !self.load_secure_async(old_key).await? {
            return Ok(false);
        }
        let ok = self.save_async(Some(new_key)).await?;
        if ok {
            info!("✅ Encryption key exchanged for {}", self.owner);
        }
        Ok(ok)
    }

    // ---- maintenance and access ---------------------------------------

    /// Removes every key from the local plaintext store.
    pub fn clear(&self) -> Result<()> {
        self.lock_store().clear()
    }

    /// Removes every entry from the secure store.
    pub async fn clear_secure(&self) -> Result<()> {
        self.secure_store()?.remove_all().await
    }

    /// Clone of the current settings instance.
    pub fn snapshot(&self) -> M
    where
        M: Clone,
    {
        self.lock_settings().clone()
    }

    /// Runs `f` against the settings instance under the lock.
    pub fn edit<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.lock_settings())
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Shorthand for registering an encryption error handler.
    pub fn on_encryption_error<F>(&self, handler: F)
    where
        F: Fn(&EncryptionErrorEvent) + Send + Sync + 'static,
    {
        self.events.on_encryption_error(handler)
    }
}

/// Builder for [`SettingsManager`]. The app name selects the default
/// config directory and the keychain service name.
pub struct SettingsManagerBuilder<M: SettingsModel> {
    app_name: String,
    config_dir: Option<PathBuf>,
    store: Option<Box<dyn PreferenceStore>>,
    secure: Option<Box<dyn SecureStore>>,
    cloud: Option<Box<dyn CloudStore>>,
    cipher: Option<Box<dyn TextCipher>>,
    initial: Option<M>,
}

impl<M: SettingsModel> SettingsManagerBuilder<M> {
    /// Directory for the default JSON file store.
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Seed the managed instance instead of starting from `M::default()`.
    pub fn initial(mut self, settings: M) -> Self {
        self.initial = Some(settings);
        self
    }

    /// Use a custom plaintext store instead of the default JSON file.
    pub fn store(mut self, store: impl PreferenceStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn secure_store(mut self, store: impl SecureStore + 'static) -> Self {
        self.secure = Some(Box::new(store));
        self
    }

    /// Route secure members to the OS keychain, keyed by the app name.
    #[cfg(feature = "keychain")]
    pub fn with_keychain(self) -> Self {
        let service = self.app_name.clone();
        self.secure_store(crate::security::KeychainStore::new(&service))
    }

    pub fn cloud_store(mut self, store: impl CloudStore + 'static) -> Self {
        self.cloud = Some(Box::new(store));
        self
    }

    pub fn cipher(mut self, cipher: impl TextCipher + 'static) -> Self {
        self.cipher = Some(Box::new(cipher));
        self
    }

    pub fn build(self) -> Result<SettingsManager<M>> {
        let store = match self.store {
            Some(store) => store,
            None => Self::default_store(&self.app_name, self.config_dir.as_deref())?,
        };
        Ok(SettingsManager {
            owner: short_type_name::<M>(),
            settings: Mutex::new(self.initial.unwrap_or_default()),
            store: Mutex::new(store),
            secure: self.secure,
            cloud: self.cloud.map(Mutex::new),
            cipher_impl: self.cipher.or_else(Self::default_cipher),
            events: EventManager::new(),
        })
    }

    #[cfg(feature = "json")]
    fn default_store(app_name: &str, dir: Option<&Path>) -> Result<Box<dyn PreferenceStore>> {
        Ok(Box::new(crate::storage::JsonFileStore::open(app_name, dir)?))
    }

    #[cfg(not(feature = "json"))]
    fn default_store(_app_name: &str, _dir: Option<&Path>) -> Result<Box<dyn PreferenceStore>> {
        Err(Error::Storage(
            "no preference store configured and the json feature is disabled".into(),
        ))
    }

    #[cfg(feature = "aead")]
    fn default_cipher() -> Option<Box<dyn TextCipher>> {
        Some(Box::new(crate::security::AeadCipher::new()))
    }

    #[cfg(not(feature = "aead"))]
    fn default_cipher() -> Option<Box<dyn TextCipher>> {
        None
    }
}
