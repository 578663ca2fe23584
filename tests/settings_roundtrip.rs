//! Synchronous walk behavior against the plaintext store.

mod common;

use common::*;
use prefsync::{field, Error, FieldPolicy, MemoryCloudStore, SettingsManager, SettingsTarget};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_save_then_load_restores_fields() {
    let store = SharedStore::new();

    let first = local_manager(&store);
    first.edit(|s| {
        s.theme = "light".into();
        s.max_items = 12;
        s.scale = 1.5;
        s.onboarded = true;
    });
    first.save().expect("save");

    let second = local_manager(&store);
    second.load().expect("load");
    assert_eq!(second.snapshot(), first.snapshot());
}

#[test]
fn test_canonical_keys_are_stable() {
    let store = SharedStore::new();
    let manager = local_manager(&store);
    manager.save().expect("save");

    assert!(store.raw("PS_v1_theme_LocalSettings").is_some());
    assert!(store.raw("PS_v1_max_items_LocalSettings").is_some());

    // Same inputs, same key, on every call.
    let policy = FieldPolicy::text("system");
    assert_eq!(
        prefsync::full_setting_name("LocalSettings", "theme", &policy),
        prefsync::full_setting_name("LocalSettings", "theme", &policy),
    );
}

#[test]
fn test_delete_writes_default_to_member_and_backend() {
    let store = SharedStore::new();
    let manager = local_manager(&store);

    manager.edit(|s| s.max_items = 9);
    manager.save().expect("save");
    assert_eq!(store.raw("PS_v1_max_items_LocalSettings"), Some(json!(9)));

    manager.delete().expect("delete");
    assert_eq!(manager.edit(|s| s.max_items), 5);
    // The key stays present, holding the default.
    assert_eq!(store.raw("PS_v1_max_items_LocalSettings"), Some(json!(5)));
}

#[test]
fn test_reset_field_matches_delete_semantics() {
    let store = SharedStore::new();
    let manager = local_manager(&store);

    manager.edit(|s| s.max_items = 40);
    manager.save_field(field!(LocalSettings: max_items)).expect("save");
    manager.reset_field(field!(LocalSettings: max_items)).expect("reset");

    assert_eq!(manager.edit(|s| s.max_items), 5);
    assert_eq!(store.raw("PS_v1_max_items_LocalSettings"), Some(json!(5)));
}

#[test]
fn test_single_field_save_leaves_others_untouched() {
    let store = SharedStore::new();
    let manager = local_manager(&store);

    manager.edit(|s| {
        s.theme = "light".into();
        s.max_items = 9;
    });
    manager.save_field(field!(LocalSettings: theme)).expect("save");

    assert!(store.raw("PS_v1_theme_LocalSettings").is_some());
    assert!(store.raw("PS_v1_max_items_LocalSettings").is_none());
}

#[test]
fn test_load_of_unsaved_settings_applies_defaults() {
    let store = SharedStore::new();
    let manager = local_manager(&store);

    manager.edit(|s| s.theme = "light".into());
    manager.load().expect("load");
    assert_eq!(manager.snapshot(), LocalSettings::default());
}

#[test]
fn test_unknown_field_is_rejected() {
    let store = SharedStore::new();
    let manager = local_manager(&store);

    let err = manager.load_field("no_such_field").expect_err("must fail");
    assert!(matches!(err, Error::UnknownField(name) if name == "no_such_field"));
}

#[test]
fn test_sync_walk_rejects_secure_members() {
    let store = SharedStore::new();
    let secure = Arc::new(prefsync::MemorySecureStore::new());
    let manager = demo_manager(&store, &secure);

    let err = manager.save().expect_err("secure members need async");
    assert!(matches!(err, Error::SecureRequiresAsync(_)));
}

#[test]
fn test_cloud_target_without_store_errors() {
    let store = SharedStore::new();
    let manager = local_manager(&store);

    let err = manager
        .save_with(SettingsTarget::Cloud)
        .expect_err("no cloud store configured");
    assert!(matches!(err, Error::CloudUnavailable));
}

#[test]
fn test_cloud_roundtrip() {
    let manager = SettingsManager::<LocalSettings>::builder("prefsync-tests")
        .store(SharedStore::new())
        .cloud_store(MemoryCloudStore::new())
        .build()
        .expect("manager builds");

    manager.edit(|s| s.theme = "light".into());
    manager.save_with(SettingsTarget::Cloud).expect("save");

    manager.edit(|s| s.theme = "broken".into());
    manager.load_with(SettingsTarget::Cloud).expect("load");
    assert_eq!(manager.edit(|s| s.theme.clone()), "light");
}
