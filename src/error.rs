//! Error and result types for the crate.

use crate::engine::SettingsTarget;

/// Errors raised by the settings engine and its backends.
///
/// Policy violations (`SecureTypeViolation`, `SecureRequiresAsync`,
/// `SecureTargetUnsupported`) and `MissingEncryptionKey` are fatal and
/// surface immediately. Recoverable per-field encryption faults never
/// appear here; the walk reports them through
/// [`ProcessOutcome::EncryptionError`](crate::ProcessOutcome) and the
/// encryption error event instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field was marked secure but its registered kind is not `Text`.
    #[error("only string settings are allowed for secure storage: {0}")]
    SecureTypeViolation(String),

    /// A secure field was reached through the synchronous API.
    #[error("secure storage is only available through the async API: {0}")]
    SecureRequiresAsync(String),

    /// Secure storage was requested for a target that cannot provide it.
    #[error("secure storage is not available for the {0:?} target")]
    SecureTargetUnsupported(SettingsTarget),

    /// An encrypted field was processed without a non-empty key.
    #[error("an encryption key is required to process encrypted settings")]
    MissingEncryptionKey,

    /// A single-field operation referenced a name with no registry entry.
    #[error("unknown settings field: {0}")]
    UnknownField(String),

    /// The cloud target was selected but no cloud store is configured.
    #[error("no cloud store is configured")]
    CloudUnavailable,

    /// A secure field was processed but no secure store is configured.
    #[error("no secure store is configured")]
    SecureUnavailable,

    /// An encrypted field was processed but no cipher is configured.
    #[error("no cipher is configured")]
    CipherUnavailable,

    /// A cipher operation failed.
    #[error("encryption error: {0}")]
    Cipher(String),

    /// A storage backend reported a fault. Propagated unchanged.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "keychain")]
    #[error("keyring error: {0}")]
    Keyring(String),
}

pub type Result<T> = std::result::Result<T, Error>;
