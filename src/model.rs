//! Per-field policy metadata and the settings registry.
//!
//! Instead of runtime reflection, each settings type provides a static
//! registry of field bindings: an accessor, a mutator and the policy the
//! engine resolves per field. The [`settings_model!`] macro builds the
//! registry from a field list; hand-written bindings work the same way.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::value::{SettingKind, SettingValue};

/// Declarative per-field policy: name override, default value, secure
/// flag, encrypt flag and export-skip flag. Declared once per field,
/// immutable at runtime.
#[derive(Debug, Clone)]
pub struct FieldPolicy {
    pub name_override: Option<&'static str>,
    pub default: SettingValue,
    pub secure: bool,
    pub encrypt: bool,
    pub skip_for_export: bool,
}

impl FieldPolicy {
    pub fn new(default: SettingValue) -> Self {
        Self {
            name_override: None,
            default,
            secure: false,
            encrypt: false,
            skip_for_export: false,
        }
    }

    pub fn bool(default: bool) -> Self {
        Self::new(SettingValue::Bool(default))
    }

    pub fn i32(default: i32) -> Self {
        Self::new(SettingValue::I32(default))
    }

    pub fn i64(default: i64) -> Self {
        Self::new(SettingValue::I64(default))
    }

    pub fn f32(default: f32) -> Self {
        Self::new(SettingValue::F32(default))
    }

    pub fn f64(default: f64) -> Self {
        Self::new(SettingValue::F64(default))
    }

    pub fn text(default: &str) -> Self {
        Self::new(SettingValue::Text(default.to_string()))
    }

    pub fn timestamp(default: DateTime<Utc>) -> Self {
        Self::new(SettingValue::Timestamp(default))
    }

    pub fn json(default: Value) -> Self {
        Self::new(SettingValue::Json(default))
    }

    /// Override the storage name. Overridden names are used verbatim in
    /// the canonical key and must be globally unique per settings type.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name_override = Some(name);
        self
    }

    /// Route this field through the secure store. Secure fields must be
    /// of kind `Text` and are only reachable through the async API.
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Encrypt the value before it reaches the secure store. Only
    /// meaningful together with [`secure`](Self::secure).
    pub fn encrypt(mut self) -> Self {
        self.encrypt = true;
        self
    }

    /// Exclude this field from dictionary exports.
    pub fn skip_for_export(mut self) -> Self {
        self.skip_for_export = true;
        self
    }
}

/// Registry entry for one field of a settings type: identity, kind,
/// policy and the accessor/mutator pair the engine uses to read and
/// write the field.
pub struct FieldBinding<M> {
    pub name: &'static str,
    pub kind: SettingKind,
    pub policy: FieldPolicy,
    get: fn(&M) -> SettingValue,
    set: fn(&mut M, SettingValue),
}

impl<M> FieldBinding<M> {
    pub fn new(
        name: &'static str,
        kind: SettingKind,
        policy: FieldPolicy,
        get: fn(&M) -> SettingValue,
        set: fn(&mut M, SettingValue),
    ) -> Self {
        Self {
            name,
            kind,
            policy,
            get,
            set,
        }
    }

    /// Read the field's current value from the settings object.
    pub fn value_of(&self, settings: &M) -> SettingValue {
        (self.get)(settings)
    }

    /// Write a value back onto the settings object.
    pub fn apply(&self, settings: &mut M, value: SettingValue) {
        (self.set)(settings, value)
    }
}

/// A settings type with a static field registry.
///
/// The registry is rebuilt on every walk; bindings are plain fn pointers
/// so this is cheap. Declaration order is the iteration order of the
/// walk but carries no correctness guarantee.
pub trait SettingsModel: Default + Send + 'static {
    fn bindings() -> Vec<FieldBinding<Self>>
    where
        Self: Sized;
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_binding {
    ($model:ty, $field:ident, Json, $policy:expr) => {
        $crate::FieldBinding::<$model>::new(
            stringify!($field),
            $crate::SettingKind::Json,
            $policy,
            |s| {
                $crate::SettingValue::Json(
                    $crate::__private::serde_json::to_value(&s.$field)
                        .unwrap_or($crate::__private::serde_json::Value::Null),
                )
            },
            |s, v| {
                if let $crate::SettingValue::Json(json) = v {
                    if let Ok(parsed) = $crate::__private::serde_json::from_value(json) {
                        s.$field = parsed;
                    }
                }
            },
        )
    };
    ($model:ty, $field:ident, $kind:ident, $policy:expr) => {
        $crate::FieldBinding::<$model>::new(
            stringify!($field),
            $crate::SettingKind::$kind,
            $policy,
            |s| $crate::SettingValue::from(s.$field.clone()),
            |s, v| {
                if let Ok(parsed) = ::std::convert::TryInto::try_into(v) {
                    s.$field = parsed;
                }
            },
        )
    };
}

/// Implements [`SettingsModel`] for a struct from a field list.
///
/// ```
/// use prefsync::{settings_model, FieldPolicy};
///
/// #[derive(Default)]
/// struct AppSettings {
///     retries: i32,
///     token: String,
/// }
///
/// settings_model! {
///     AppSettings {
///         retries: I32 => FieldPolicy::i32(3),
///         token: Text => FieldPolicy::text("").secure().encrypt(),
///     }
/// }
/// ```
///
/// Fields of compound types use the `Json` kind and serialize through
/// serde. Fields left out of the list are invisible to the engine.
#[macro_export]
macro_rules! settings_model {
    ($model:ty { $( $field:ident : $kind:ident => $policy:expr ),+ $(,)? }) => {
        impl $crate::SettingsModel for $model {
            fn bindings() -> ::std::vec::Vec<$crate::FieldBinding<Self>> {
                ::std::vec![
                    $( $crate::__field_binding!($model, $field, $kind, $policy) ),+
                ]
            }
        }
    };
}

/// Compile-time checked field token for single-field operations.
///
/// Expands to the field's registry name and fails to compile when the
/// member does not exist on the settings type.
#[macro_export]
macro_rules! field {
    ($model:ty : $field:ident) => {{
        #[allow(unused)]
        fn __field_exists(s: &$model) {
            let _ = &s.$field;
        }
        stringify!($field)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct Probe {
        enabled: bool,
        retries: i32,
        label: String,
        urls: Vec<String>,
    }

    settings_model! {
        Probe {
            enabled: Bool => FieldPolicy::bool(true),
            retries: I32 => FieldPolicy::i32(3),
            label: Text => FieldPolicy::text("probe").named("ProbeLabel"),
            urls: Json => FieldPolicy::json(serde_json::json!([])),
        }
    }

    #[test]
    fn test_bindings_cover_declared_fields() {
        let names: Vec<_> = Probe::bindings().iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["enabled", "retries", "label", "urls"]);
    }

    #[test]
    fn test_accessor_and_mutator_roundtrip() {
        let mut probe = Probe::default();
        let bindings = Probe::bindings();
        let retries = &bindings[1];

        retries.apply(&mut probe, SettingValue::I32(9));
        assert_eq!(probe.retries, 9);
        assert_eq!(retries.value_of(&probe), SettingValue::I32(9));
    }

    #[test]
    fn test_json_binding_uses_serde() {
        let mut probe = Probe::default();
        let bindings = Probe::bindings();
        let urls = &bindings[3];

        urls.apply(
            &mut probe,
            SettingValue::Json(serde_json::json!(["https://a", "https://b"])),
        );
        assert_eq!(probe.urls, vec!["https://a", "https://b"]);
    }

    #[test]
    fn test_mismatched_kind_leaves_field_untouched() {
        let mut probe = Probe::default();
        probe.retries = 5;
        let bindings = Probe::bindings();
        bindings[1].apply(&mut probe, SettingValue::Text("nope".into()));
        assert_eq!(probe.retries, 5);
    }

    #[test]
    fn test_field_token_matches_registry_name() {
        assert_eq!(field!(Probe: retries), "retries");
    }
}
