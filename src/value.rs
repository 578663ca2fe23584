//! The closed set of value kinds a setting can hold, and the coercion
//! rules that map raw stored values back into those kinds.
//!
//! The wire form of every setting is a `serde_json::Value`. Scalar kinds
//! map natively; the `Json` kind round-trips through a JSON-encoded
//! string so that compound types survive backends that only store text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage kind of a registered field, fixed at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingKind {
    Bool,
    I32,
    I64,
    F32,
    F64,
    Text,
    Timestamp,
    Json,
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(Value),
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Bool(_) => SettingKind::Bool,
            SettingValue::I32(_) => SettingKind::I32,
            SettingValue::I64(_) => SettingKind::I64,
            SettingValue::F32(_) => SettingKind::F32,
            SettingValue::F64(_) => SettingKind::F64,
            SettingValue::Text(_) => SettingKind::Text,
            SettingValue::Timestamp(_) => SettingKind::Timestamp,
            SettingValue::Json(_) => SettingKind::Json,
        }
    }

    /// The raw form written to a backend.
    pub fn to_wire(&self) -> Value {
        match self {
            SettingValue::Bool(b) => Value::Bool(*b),
            SettingValue::I32(i) => Value::from(*i),
            SettingValue::I64(i) => Value::from(*i),
            SettingValue::F32(f) => Value::from(*f),
            SettingValue::F64(f) => Value::from(*f),
            SettingValue::Text(s) => Value::String(s.clone()),
            SettingValue::Timestamp(t) => Value::String(t.to_rfc3339()),
            SettingValue::Json(v) => {
                Value::String(serde_json::to_string(v).unwrap_or_default())
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}
impl From<i32> for SettingValue {
    fn from(v: i32) -> Self {
        SettingValue::I32(v)
    }
}
impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::I64(v)
    }
}
impl From<f32> for SettingValue {
    fn from(v: f32) -> Self {
        SettingValue::F32(v)
    }
}
impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::F64(v)
    }
}
impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Text(v)
    }
}
impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}
impl From<DateTime<Utc>> for SettingValue {
    fn from(v: DateTime<Utc>) -> Self {
        SettingValue::Timestamp(v)
    }
}

macro_rules! try_from_setting {
    ($ty:ty, $variant:ident) => {
        impl TryFrom<SettingValue> for $ty {
            type Error = SettingValue;
            fn try_from(v: SettingValue) -> Result<Self, SettingValue> {
                match v {
                    SettingValue::$variant(x) => Ok(x),
                    other => Err(other),
                }
            }
        }
    };
}

try_from_setting!(bool, Bool);
try_from_setting!(i32, I32);
try_from_setting!(i64, I64);
try_from_setting!(f32, F32);
try_from_setting!(f64, F64);
try_from_setting!(String, Text);
try_from_setting!(DateTime<Utc>, Timestamp);

/// Converts an already-fetched raw value into the registered kind,
/// falling back to `default` when conversion is impossible.
///
/// A `Json` field whose stored text does not parse degrades to the raw
/// string so a stale or foreign payload never fails a load.
pub fn coerce(raw: &Value, kind: SettingKind, default: &SettingValue) -> SettingValue {
    if raw.is_null() {
        return default.clone();
    }
    match kind {
        SettingKind::Bool => raw
            .as_bool()
            .map(SettingValue::Bool)
            .unwrap_or_else(|| default.clone()),
        SettingKind::I32 => raw
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .or_else(|| raw.as_str().and_then(|s| s.parse().ok()))
            .map(SettingValue::I32)
            .unwrap_or_else(|| default.clone()),
        SettingKind::I64 => raw
            .as_i64()
            .or_else(|| raw.as_str().and_then(|s| s.parse().ok()))
            .map(SettingValue::I64)
            .unwrap_or_else(|| default.clone()),
        SettingKind::F32 => raw
            .as_f64()
            .map(|f| f as f32)
            .or_else(|| raw.as_str().and_then(|s| s.parse().ok()))
            .map(SettingValue::F32)
            .unwrap_or_else(|| default.clone()),
        SettingKind::F64 => raw
            .as_f64()
            .or_else(|| raw.as_str().and_then(|s| s.parse().ok()))
            .map(SettingValue::F64)
            .unwrap_or_else(|| default.clone()),
        SettingKind::Text => match raw {
            Value::String(s) => SettingValue::Text(s.clone()),
            other => SettingValue::Text(other.to_string()),
        },
        SettingKind::Timestamp => raw
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| SettingValue::Timestamp(t.with_timezone(&Utc)))
            .unwrap_or_else(|| default.clone()),
        SettingKind::Json => match raw {
            Value::String(text) => match serde_json::from_str(text) {
                Ok(parsed) => SettingValue::Json(parsed),
                // Unknown payload, keep the raw string instead of failing.
                Err(_) => SettingValue::Json(Value::String(text.clone())),
            },
            structured => SettingValue::Json(structured.clone()),
        },
    }
}
