// Basic usage example for prefsync
//
// Run with: cargo run --example basic_usage

use prefsync::{field, settings_model, FieldPolicy, MemorySecureStore, SettingsManager};
use serde_json::json;

// Define your settings struct and register its fields
#[derive(Debug, Default, Clone)]
struct AppSettings {
    theme: String,
    font_size: f64,
    connection_check_urls: Vec<String>,
    api_token: String,
}

settings_model! {
    AppSettings {
        theme: Text => FieldPolicy::text("dark"),
        font_size: F64 => FieldPolicy::f64(14.0),
        connection_check_urls: Json => FieldPolicy::json(json!(["https://example.com"])),
        api_token: Text => FieldPolicy::text("").secure().encrypt().skip_for_export(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // The secure store would normally be the OS keychain (enable the
    // `keychain` feature and call `.with_keychain()`)
    let manager = SettingsManager::<AppSettings>::builder("prefsync-demo")
        .config_dir("./demo_config")
        .secure_store(MemorySecureStore::new())
        .build()?;

    println!("📦 prefsync Basic Usage Example\n");

    // Load settings (falls back to defaults on first run)
    manager.load_async(Some("K1")).await?;
    println!("✅ Loaded settings: {:?}\n", manager.snapshot());

    // Update a few values and persist them
    println!("🔧 Changing theme and storing a token...");
    manager.edit(|s| {
        s.theme = "light".into();
        s.api_token = "abc123".into();
    });
    manager.save_async(Some("K1")).await?;

    // Reset a single field to its default
    println!("🔄 Resetting theme to default...");
    manager.reset_field(field!(AppSettings: theme))?;
    println!("✅ Theme reset to: {}\n", manager.edit(|s| s.theme.clone()));

    // Export for backup; the token is flagged skip-for-export
    let exported = manager.export().await?;
    println!("💾 Exported {} settings", exported.len());

    // Rotate the encryption key
    println!("🔑 Rotating the encryption key...");
    manager.exchange_key("K2", Some("K1"), true).await?;

    Ok(())
}
