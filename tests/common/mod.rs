#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use prefsync::{
    settings_model, FieldPolicy, MemorySecureStore, MemoryStore, PreferenceStore, Result,
    SettingsManager,
};
use serde_json::{json, Value};

/// Mixed settings model: plaintext, secure and encrypted members.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoSettings {
    pub tray_enabled: bool,
    pub retries: i32,
    pub bandwidth_limit: f64,
    pub display_name: String,
    pub last_sync: DateTime<Utc>,
    pub connection_urls: Vec<String>,
    pub session_cache: String,
    pub pin: String,
    pub token: String,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            tray_enabled: true,
            retries: 3,
            bandwidth_limit: 0.0,
            display_name: "anonymous".into(),
            last_sync: DateTime::UNIX_EPOCH,
            connection_urls: vec![],
            session_cache: String::new(),
            pin: String::new(),
            token: String::new(),
        }
    }
}

settings_model! {
    DemoSettings {
        tray_enabled: Bool => FieldPolicy::bool(true),
        retries: I32 => FieldPolicy::i32(3),
        bandwidth_limit: F64 => FieldPolicy::f64(0.0),
        display_name: Text => FieldPolicy::text("anonymous").named("DisplayName"),
        last_sync: Timestamp => FieldPolicy::timestamp(DateTime::UNIX_EPOCH),
        connection_urls: Json => FieldPolicy::json(json!([])),
        session_cache: Text => FieldPolicy::text("").skip_for_export(),
        pin: Text => FieldPolicy::text("").secure(),
        token: Text => FieldPolicy::text("").secure().encrypt(),
    }
}

/// Plaintext-only model for the synchronous walk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LocalSettings {
    pub theme: String,
    pub max_items: i64,
    pub scale: f32,
    pub onboarded: bool,
}

settings_model! {
    LocalSettings {
        theme: Text => FieldPolicy::text("system"),
        max_items: I64 => FieldPolicy::i64(5),
        scale: F32 => FieldPolicy::f32(1.0),
        onboarded: Bool => FieldPolicy::bool(false),
    }
}

/// Memory store that stays inspectable after the manager takes it.
#[derive(Clone, Default)]
pub struct SharedStore(Arc<Mutex<MemoryStore>>);

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<Value> {
        self.0.lock().expect("store lock").get(key)
    }
}

impl PreferenceStore for SharedStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.0.lock().expect("store lock").get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.0.lock().expect("store lock").set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.0.lock().expect("store lock").remove(key)
    }

    fn clear(&mut self) -> Result<()> {
        self.0.lock().expect("store lock").clear()
    }
}

pub fn demo_manager(
    store: &SharedStore,
    secure: &Arc<MemorySecureStore>,
) -> SettingsManager<DemoSettings> {
    SettingsManager::<DemoSettings>::builder("prefsync-tests")
        .store(store.clone())
        .secure_store(secure.clone())
        .build()
        .expect("manager builds")
}

pub fn local_manager(store: &SharedStore) -> SettingsManager<LocalSettings> {
    SettingsManager::<LocalSettings>::builder("prefsync-tests")
        .store(store.clone())
        .build()
        .expect("manager builds")
}

pub const TOKEN_KEY: &str = "PS_v1_token_DemoSettings";
pub const PIN_KEY: &str = "PS_v1_pin_DemoSettings";
pub const RETRIES_KEY: &str = "PS_v1_retries_DemoSettings";
pub const DISPLAY_NAME_KEY: &str = "PS_v1_DisplayName";
pub const SESSION_CACHE_KEY: &str = "PS_v1_session_cache_DemoSettings";
