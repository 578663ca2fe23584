//! Text encryption primitive.
//!
//! The engine only needs two operations: encrypt a string under a key
//! and decrypt it again, failing loudly when the key does not match.
//! The default implementation uses AES-256-GCM; authenticated
//! encryption guarantees a wrong key surfaces as an error rather than
//! as garbage plaintext.

use crate::error::{Error, Result};

/// Opaque string encryption capability.
pub trait TextCipher: Send + Sync {
    /// Encrypts `plain` under `key` into a transport-safe text form.
    fn encrypt_to_text(&self, plain: &str, key: &str) -> Result<String>;

    /// Reverses [`encrypt_to_text`](Self::encrypt_to_text). Fails on a
    /// key mismatch or malformed input.
    fn decrypt_from_text(&self, cipher_text: &str, key: &str) -> Result<String>;
}

#[cfg(feature = "aead")]
pub use aead_impl::AeadCipher;

#[cfg(feature = "aead")]
mod aead_impl {
    use aes_gcm::aead::{Aead, KeyInit};
    use aes_gcm::{Aes256Gcm, Nonce};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use rand::RngCore;
    use sha2::{Digest, Sha256};

    use super::{Error, Result, TextCipher};

    /// 96-bit nonce, the AES-GCM standard size.
    const NONCE_SIZE: usize = 12;

    /// AES-256-GCM [`TextCipher`].
    ///
    /// The key string is stretched to 256 bits with SHA-256; the output
    /// is base64 over nonce followed by ciphertext. A fresh random nonce
    /// is drawn per encryption, so identical plaintexts produce
    /// different cipher texts.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct AeadCipher;

    impl AeadCipher {
        pub fn new() -> Self {
            Self
        }

        fn cipher_for(key: &str) -> Aes256Gcm {
            Aes256Gcm::new(&Sha256::digest(key.as_bytes()))
        }
    }

    impl TextCipher for AeadCipher {
        fn encrypt_to_text(&self, plain: &str, key: &str) -> Result<String> {
            let cipher = Self::cipher_for(key);
            let mut nonce_bytes = [0u8; NONCE_SIZE];
            rand::rng().fill_bytes(&mut nonce_bytes);

            let cipher_bytes = cipher
                .encrypt(Nonce::from_slice(&nonce_bytes), plain.as_bytes())
                .map_err(|e| Error::Cipher(format!("encryption failed: {e}")))?;

            let mut out = Vec::with_capacity(NONCE_SIZE + cipher_bytes.len());
            out.extend_from_slice(&nonce_bytes);
            out.extend_from_slice(&cipher_bytes);
            Ok(STANDARD.encode(out))
        }

        fn decrypt_from_text(&self, cipher_text: &str, key: &str) -> Result<String> {
            let bytes = STANDARD
                .decode(cipher_text)
                .map_err(|e| Error::Cipher(format!("invalid base64: {e}")))?;
            if bytes.len() < NONCE_SIZE {
                return Err(Error::Cipher("cipher text too short".into()));
            }

            let (nonce_bytes, cipher_bytes) = bytes.split_at(NONCE_SIZE);
            let plain = Self::cipher_for(key)
                .decrypt(Nonce::from_slice(nonce_bytes), cipher_bytes)
                .map_err(|_| {
                    Error::Cipher("decryption failed (wrong key or tampered data)".into())
                })?;

            String::from_utf8(plain).map_err(|e| Error::Cipher(format!("invalid UTF-8: {e}")))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_roundtrip() {
            let cipher = AeadCipher::new();
            let encrypted = cipher.encrypt_to_text("abc123", "K1").expect("encrypt");
            assert_ne!(encrypted, "abc123");
            assert_eq!(
                cipher.decrypt_from_text(&encrypted, "K1").expect("decrypt"),
                "abc123"
            );
        }

        #[test]
        fn test_wrong_key_fails() {
            let cipher = AeadCipher::new();
            let encrypted = cipher.encrypt_to_text("abc123", "K1").expect("encrypt");
            assert!(cipher.decrypt_from_text(&encrypted, "K2").is_err());
        }

        #[test]
        fn test_nonce_varies_per_encryption() {
            let cipher = AeadCipher::new();
            let first = cipher.encrypt_to_text("same", "K1").expect("encrypt");
            let second = cipher.encrypt_to_text("same", "K1").expect("encrypt");
            assert_ne!(first, second);
        }

        #[test]
        fn test_malformed_input_fails() {
            let cipher = AeadCipher::new();
            assert!(cipher.decrypt_from_text("%%%", "K1").is_err());
            assert!(cipher.decrypt_from_text("AAAA", "K1").is_err());
        }
    }
}
