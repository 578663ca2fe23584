//! Canonical storage key construction.
//!
//! Keys are a pure function of the owning type name, the member name (or
//! its policy override) and the fixed format constants below. Changing
//! `FORMAT_VERSION` invalidates every previously stored key and is the
//! explicit migration boundary of the storage format.

use crate::model::FieldPolicy;

pub const NAME_PREFIX: &str = "PS";
pub const FORMAT_VERSION: &str = "v1";

/// Builds the canonical key for one field.
///
/// Without an override the key carries the owning type name as a suffix
/// to keep member names from different settings types apart. An override
/// is used verbatim and must already be globally unique.
pub fn full_setting_name(owner: &str, member: &str, policy: &FieldPolicy) -> String {
    match policy.name_override {
        Some(name) => format!("{NAME_PREFIX}_{FORMAT_VERSION}_{name}"),
        None => format!("{NAME_PREFIX}_{FORMAT_VERSION}_{member}_{owner}"),
    }
}

/// Common prefix of every key this crate writes.
pub fn settings_name_prefix() -> String {
    format!("{NAME_PREFIX}_{FORMAT_VERSION}")
}

/// Last path segment of a type name, e.g. `app::config::AppSettings`
/// becomes `AppSettings`.
pub(crate) fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SettingValue;

    #[test]
    fn test_full_name_without_override() {
        let policy = FieldPolicy::new(SettingValue::I32(0));
        assert_eq!(
            full_setting_name("AppSettings", "retries", &policy),
            "PS_v1_retries_AppSettings"
        );
    }

    #[test]
    fn test_full_name_with_override_drops_type_suffix() {
        let policy = FieldPolicy::new(SettingValue::Text(String::new())).named("ApiToken");
        assert_eq!(
            full_setting_name("AppSettings", "token", &policy),
            "PS_v1_ApiToken"
        );
    }

    #[test]
    fn test_full_name_is_deterministic() {
        let policy = FieldPolicy::bool(false);
        let first = full_setting_name("AppSettings", "tray_enabled", &policy);
        let second = full_setting_name("AppSettings", "tray_enabled", &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn test_short_type_name_strips_path() {
        struct Inner;
        assert_eq!(short_type_name::<Inner>(), "Inner");
    }
}
