//! Key-management capability used to seal and unseal the secrets blob.
//!
//! The handler only depends on the [`KeyManagement`] trait, so a cloud KMS
//! client or a test double can be injected at construction time.
//! [`LocalKms`] is an in-process AES-256-GCM backend for local deployments.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use rand::RngCore;
use thiserror::Error;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Errors reported by a key-management backend.
#[derive(Debug, Error)]
pub enum KmsError {
    #[error("invalid master key: {0}")]
    InvalidKey(String),

    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("decryption failed (wrong key or corrupted data)")]
    DecryptionFailed,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("key management service error: {0}")]
    Service(String),
}

/// Encrypt/decrypt capability bound to a master key identifier.
///
/// Implementations must be safe for concurrent use; the handler shares one
/// instance across all requests.
pub trait KeyManagement: Send + Sync {
    /// Encrypt `plaintext` under `key_id`, returning an opaque string.
    fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<String, KmsError>;

    /// Decrypt an opaque string previously produced by [`KeyManagement::encrypt`].
    fn decrypt(&self, key_id: &str, ciphertext: &str) -> Result<Vec<u8>, KmsError>;
}

/// In-process AES-256-GCM key management.
///
/// Output format is `base64url(nonce || ciphertext || tag)` without padding,
/// so blobs can be passed as a query parameter. The key id is bound as
/// associated data; a blob sealed under one key id does not open under another.
#[derive(Clone)]
pub struct LocalKms {
    key: [u8; 32],
}

impl LocalKms {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Parse a 32-byte master key from 64 hex chars or base64.
    pub fn from_encoded(raw: &str) -> Result<Self, KmsError> {
        let trimmed = raw.trim();

        let bytes = if trimmed.len() == 64 {
            hex::decode(trimmed).ok()
        } else {
            None
        }
        .or_else(|| STANDARD.decode(trimmed).ok())
        .ok_or_else(|| {
            KmsError::InvalidKey("must be 32 bytes encoded as 64 hex chars or base64".to_string())
        })?;

        let key: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            KmsError::InvalidKey(format!("expected 32 bytes, got {}", b.len()))
        })?;

        Ok(Self::new(key))
    }

    fn cipher(&self) -> Result<Aes256Gcm, KmsError> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|e| KmsError::InvalidKey(e.to_string()))
    }
}

impl fmt::Debug for LocalKms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LocalKms([REDACTED])")
    }
}

impl KeyManagement for LocalKms {
    fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<String, KmsError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = self
            .cipher()?
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: key_id.as_bytes(),
                },
            )
            .map_err(|e| KmsError::EncryptionFailed(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        Ok(URL_SAFE_NO_PAD.encode(blob))
    }

    fn decrypt(&self, key_id: &str, ciphertext: &str) -> Result<Vec<u8>, KmsError> {
        let blob = URL_SAFE_NO_PAD
            .decode(ciphertext.trim())
            .map_err(|e| KmsError::InvalidCiphertext(format!("invalid base64: {e}")))?;

        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(KmsError::InvalidCiphertext(format!(
                "blob too short: {} bytes",
                blob.len()
            )));
        }

        let (nonce, sealed) = blob.split_at(NONCE_LEN);
        self.cipher()?
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: key_id.as_bytes(),
                },
            )
            .map_err(|_| KmsError::DecryptionFailed)
    }
}
