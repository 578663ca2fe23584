//! The per-field processing engine.
//!
//! One processing call handles exactly one registered field: resolve its
//! policy, compute the canonical key, route the value to the plaintext,
//! secure or cloud capability and run the requested action. The
//! processing record built here lives for one call and is never cached.
//!
//! Failure semantics: policy violations and a missing rotation key are
//! fatal errors. Cipher faults are recoverable and reported as
//! [`ProcessOutcome::EncryptionError`] plus an
//! [`EncryptionErrorEvent`](crate::EncryptionErrorEvent); the walk
//! drivers abort the remainder of the walk but keep writes already
//! applied. A field excluded by the secure-only filter is
//! [`ProcessOutcome::Skipped`], which is not an error.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::events::EncryptionErrorEvent;
use crate::manager::SettingsManager;
use crate::model::{FieldBinding, SettingsModel};
use crate::naming::full_setting_name;
use crate::value::{coerce, SettingKind, SettingValue};

/// The operation a processing call executes against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    Load,
    Save,
    Delete,
    Reset,
}

/// Which backend capability a walk addresses. Only `Local` supports
/// secure or encrypted members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsTarget {
    #[default]
    Local,
    Cloud,
}

/// Result of processing a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Success,
    /// Excluded by the secure-only filter; not an error.
    Skipped,
    /// Reserved for backend-reported failures surfaced as outcomes.
    Failed,
    /// A cipher fault or key mismatch; the walk aborts.
    EncryptionError,
}

/// One exported or imported setting: the raw wire value plus the kind it
/// was registered with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub value: Value,
    pub kind: SettingKind,
}

/// Bulk import/export format, keyed by canonical setting name.
pub type SettingsDict = HashMap<String, DictEntry>;

/// Per-walk switches, shared by every field of one walk.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WalkOptions<'a> {
    pub target: SettingsTarget,
    /// Only process secure members; plaintext members come back Skipped.
    pub secure_only: bool,
    /// The value was supplied by a dictionary; skip the backend fetch.
    pub use_supplied_value: bool,
    /// Leave stored cipher text as is (export path).
    pub keep_encrypted: bool,
    /// Run the full fetch/decrypt pipeline without mutating the object.
    pub try_load: bool,
    /// Rotation key for encrypted members.
    pub key: Option<&'a str>,
}

/// Everything resolved for one field in one call.
pub(crate) struct ProcessRecord {
    pub key: String,
    pub kind: SettingKind,
    pub default: SettingValue,
    pub value: SettingValue,
    pub secure: bool,
    pub encrypt: bool,
}

fn require_key(key: Option<&str>) -> Result<&str> {
    key.filter(|k| !k.is_empty()).ok_or(Error::MissingEncryptionKey)
}

impl<M: SettingsModel> SettingsManager<M> {
    pub(crate) fn build_record(&self, binding: &FieldBinding<M>) -> ProcessRecord {
        let policy = &binding.policy;
        ProcessRecord {
            key: full_setting_name(self.owner, binding.name, policy),
            kind: binding.kind,
            default: policy.default.clone(),
            value: policy.default.clone(),
            secure: policy.secure,
            encrypt: policy.encrypt,
        }
    }

    fn emit_cipher_fault(&self, setting_key: &str, fault: impl std::fmt::Display) {
        self.events.emit_encryption_error(EncryptionErrorEvent {
            setting_key: setting_key.to_string(),
            error: fault.to_string(),
        });
    }

    /// Synchronous processor. Plaintext members only; a secure member on
    /// this path is a fatal policy violation.
    pub(crate) fn process_field_sync(
        &self,
        settings: &mut M,
        binding: &FieldBinding<M>,
        action: SettingsAction,
        target: SettingsTarget,
    ) -> Result<ProcessOutcome> {
        let mut record = self.build_record(binding);
        debug!("Processing setting '{}' ({action:?}, sync)", record.key);
        if record.secure {
            return Err(Error::SecureRequiresAsync(record.key));
        }

        match action {
            SettingsAction::Load => {
                let raw = match target {
                    SettingsTarget::Local => self.store_get(&record.key),
                    SettingsTarget::Cloud => self.cloud_get(&record.key)?,
                };
                record.value = raw
                    .map(|r| coerce(&r, record.kind, &record.default))
                    .unwrap_or_else(|| record.default.clone());
                binding.apply(settings, record.value.clone());
            }
            SettingsAction::Save => {
                record.value = binding.value_of(settings);
                match target {
                    SettingsTarget::Local => self.store_set(&record.key, record.value.to_wire())?,
                    SettingsTarget::Cloud => self.cloud_set(&record.key, record.value.to_wire())?,
                }
            }
            SettingsAction::Delete | SettingsAction::Reset => {
                record.value = record.default.clone();
                binding.apply(settings, record.default.clone());
                self.push_plain_default(&record, target)?;
            }
        }
        Ok(ProcessOutcome::Success)
    }

    /// Asynchronous processor. Required whenever secure storage or
    /// encryption is involved; also handles plaintext members so one
    /// walk can mix both.
    pub(crate) async fn process_field_async(
        &self,
        binding: &FieldBinding<M>,
        action: SettingsAction,
        opts: WalkOptions<'_>,
        supplied: Option<&Value>,
    ) -> Result<ProcessOutcome> {
        let mut record = self.build_record(binding);
        debug!("Processing setting '{}' ({action:?}, async)", record.key);

        if record.secure {
            if opts.target == SettingsTarget::Cloud {
                return Err(Error::SecureTargetUnsupported(SettingsTarget::Cloud));
            }
            if record.kind != SettingKind::Text {
                return Err(Error::SecureTypeViolation(record.key));
            }
        } else if opts.secure_only {
            return Ok(ProcessOutcome::Skipped);
        }

        match action {
            SettingsAction::Load => {
                record.value = self.fetch_value(&record, &opts, supplied).await?;
                if record.secure && record.encrypt && !opts.keep_encrypted {
                    let rotation_key = require_key(opts.key)?;
                    let cipher_text = record.value.as_text().unwrap_or_default().to_string();
                    if !cipher_text.is_empty() {
                        let plain = match self
                            .cipher()?
                            .decrypt_from_text(&cipher_text, rotation_key)
                        {
                            Ok(plain) if plain.is_empty() => {
                                // Non-empty cipher text decrypting to nothing
                                // means the key does not match the data.
                                self.emit_cipher_fault(
                                    &record.key,
                                    "cipher text is not empty but the decrypted text is, \
                                     this indicates a key mismatch",
                                );
                                return Ok(ProcessOutcome::EncryptionError);
                            }
                            Ok(plain) => plain,
                            Err(fault) => {
                                self.emit_cipher_fault(&record.key, fault);
                                return Ok(ProcessOutcome::EncryptionError);
                            }
                        };
                        record.value = SettingValue::Text(plain);
                    }
                }
                if !opts.try_load {
                    self.write_field(binding, record.value.clone());
                }
            }
            SettingsAction::Save => {
                record.value = self.read_field(binding);
                return self.push_value(&record, &opts, false).await;
            }
            SettingsAction::Delete | SettingsAction::Reset => {
                record.value = record.default.clone();
                self.write_field(binding, record.default.clone());
                return self.push_value(&record, &opts, true).await;
            }
        }
        Ok(ProcessOutcome::Success)
    }

    /// Key-value processor used by the export path: identical policy
    /// resolution and fetch, but nothing is written back to the object.
    /// Returns `None` for members excluded by the secure-only filter or
    /// lost to a cipher fault; the export walk keeps going.
    pub(crate) async fn process_field_kv(
        &self,
        binding: &FieldBinding<M>,
        opts: WalkOptions<'_>,
    ) -> Result<Option<(String, DictEntry)>> {
        let mut record = self.build_record(binding);

        if record.secure {
            if record.kind != SettingKind::Text {
                return Err(Error::SecureTypeViolation(record.key));
            }
        } else if opts.secure_only {
            return Ok(None);
        }

        record.value = self.fetch_value(&record, &opts, None).await?;
        if record.secure && record.encrypt && !opts.keep_encrypted {
            let rotation_key = require_key(opts.key)?;
            let cipher_text = record.value.as_text().unwrap_or_default().to_string();
            if !cipher_text.is_empty() {
                match self.cipher()?.decrypt_from_text(&cipher_text, rotation_key) {
                    Ok(plain) if plain.is_empty() => {
                        self.emit_cipher_fault(
                            &record.key,
                            "cipher text is not empty but the decrypted text is, \
                             this indicates a key mismatch",
                        );
                        return Ok(None);
                    }
                    Ok(plain) => record.value = SettingValue::Text(plain),
                    Err(fault) => {
                        self.emit_cipher_fault(&record.key, fault);
                        return Ok(None);
                    }
                }
            }
        }

        let entry = DictEntry {
            value: record.value.to_wire(),
            kind: record.kind,
        };
        Ok(Some((record.key, entry)))
    }

    /// Resolves the incoming value for a Load or export call.
    async fn fetch_value(
        &self,
        record: &ProcessRecord,
        opts: &WalkOptions<'_>,
        supplied: Option<&Value>,
    ) -> Result<SettingValue> {
        if opts.use_supplied_value {
            return Ok(supplied
                .map(|raw| coerce(raw, record.kind, &record.default))
                .unwrap_or_else(|| record.default.clone()));
        }
        if record.secure {
            let default_text = record.default.as_text().unwrap_or_default().to_string();
            let stored = self.secure_store()?.get(&record.key).await?;
            return Ok(SettingValue::Text(stored.unwrap_or(default_text)));
        }
        let raw = match opts.target {
            SettingsTarget::Local => self.store_get(&record.key),
            SettingsTarget::Cloud => self.cloud_get(&record.key)?,
        };
        Ok(raw
            .map(|r| coerce(&r, record.kind, &record.default))
            .unwrap_or_else(|| record.default.clone()))
    }

    /// Pushes `record.value` to the backend selected by the routing
    /// flags, encrypting on the way when the policy asks for it.
    async fn push_value(
        &self,
        record: &ProcessRecord,
        opts: &WalkOptions<'_>,
        remove_on_null: bool,
    ) -> Result<ProcessOutcome> {
        if record.secure {
            let text = match record.value.as_text() {
                Some(text) => text.to_string(),
                None => return Err(Error::SecureTypeViolation(record.key.clone())),
            };
            if record.encrypt && !text.is_empty() {
                let rotation_key = require_key(opts.key)?;
                let encrypted = match self.cipher()?.encrypt_to_text(&text, rotation_key) {
                    Ok(encrypted) => encrypted,
                    Err(fault) => {
                        self.emit_cipher_fault(&record.key, fault);
                        return Ok(ProcessOutcome::EncryptionError);
                    }
                };
                self.secure_set(&record.key, &encrypted).await?;
            } else {
                self.secure_set(&record.key, &text).await?;
            }
            return Ok(ProcessOutcome::Success);
        }

        match opts.target {
            SettingsTarget::Local => self.store_set(&record.key, record.value.to_wire())?,
            SettingsTarget::Cloud => {
                if remove_on_null && record.value == SettingValue::Json(Value::Null) {
                    self.cloud_delete(&record.key)?;
                } else {
                    self.cloud_set(&record.key, record.value.to_wire())?;
                }
            }
        }
        Ok(ProcessOutcome::Success)
    }

    /// Local delete and reset write the default back instead of removing
    /// the key; only the cloud target removes a key, and only when no
    /// usable default exists.
    fn push_plain_default(&self, record: &ProcessRecord, target: SettingsTarget) -> Result<()> {
        match target {
            SettingsTarget::Local => self.store_set(&record.key, record.default.to_wire()),
            SettingsTarget::Cloud => {
                if record.default == SettingValue::Json(Value::Null) {
                    self.cloud_delete(&record.key)
                } else {
                    self.cloud_set(&record.key, record.default.to_wire())
                }
            }
        }
    }
}
