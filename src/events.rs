//! Observable notifications for recoverable faults.

use std::sync::Mutex;

use log::warn;

/// Raised whenever an encrypt or decrypt step fails for a field.
///
/// Carries the canonical setting key and a description of the fault,
/// never the field's value or the encryption key itself.
#[derive(Debug, Clone)]
pub struct EncryptionErrorEvent {
    /// Canonical storage key of the affected setting.
    pub setting_key: String,
    /// Description of the causing fault.
    pub error: String,
}

type EncryptionErrorHandler = Box<dyn Fn(&EncryptionErrorEvent) + Send + Sync>;

/// Subscriber registry for engine notifications.
#[derive(Default)]
pub struct EventManager {
    encryption_error: Mutex<Vec<EncryptionErrorHandler>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for encryption error events.
    pub fn on_encryption_error<F>(&self, handler: F)
    where
        F: Fn(&EncryptionErrorEvent) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.encryption_error.lock() {
            handlers.push(Box::new(handler));
        }
    }

    pub(crate) fn emit_encryption_error(&self, event: EncryptionErrorEvent) {
        warn!(
            "Encryption error for setting '{}': {}",
            event.setting_key, event.error
        );
        if let Ok(handlers) = self.encryption_error.lock() {
            for handler in handlers.iter() {
                handler(&event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_handlers_receive_events() {
        let events = EventManager::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        events.on_encryption_error(move |event| {
            assert_eq!(event.setting_key, "PS_v1_Token");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit_encryption_error(EncryptionErrorEvent {
            setting_key: "PS_v1_Token".into(),
            error: "key mismatch".into(),
        });
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
