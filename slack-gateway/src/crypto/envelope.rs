//! Sealed secrets blob: a flat JSON object of string values encrypted with
//! the configured key-management backend.

use std::collections::HashMap;
use std::fmt;

use tracing::{info, warn};

use crate::crypto::kms::KeyManagement;
use crate::error::HandlerError;

/// Key of the Slack signing secret in the secrets map.
pub const SIGNING_SECRET_KEY: &str = "SigningSecret";

/// Key of the Slack bot token in the secrets map.
pub const TOKEN_KEY: &str = "Token";

/// Request-scoped secrets decrypted from the sealed blob.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secrets(HashMap<String, String>);

impl Secrets {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self(values)
    }

    /// Value for `key`, or an empty string when absent.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn signing_secret(&self) -> &str {
        self.get(SIGNING_SECRET_KEY)
    }

    pub fn token(&self) -> &str {
        self.get(TOKEN_KEY)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for Secrets {
    fn from(values: HashMap<String, String>) -> Self {
        Self(values)
    }
}

// Values never reach logs.
impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.0.keys().collect();
        keys.sort();
        f.debug_struct("Secrets").field("keys", &keys).finish()
    }
}

/// Decrypt a sealed blob into a [`Secrets`] map.
///
/// Fails with [`HandlerError::Decrypt`] when the backend rejects the blob and
/// with [`HandlerError::MalformedSecrets`] when the plaintext is not a flat
/// JSON object of strings.
pub fn decrypt_secrets(
    kms: &dyn KeyManagement,
    key_id: &str,
    ciphertext: &str,
) -> Result<Secrets, HandlerError> {
    let plaintext = kms.decrypt(key_id, ciphertext).map_err(|e| {
        warn!(key_id = %key_id, error = %e, "secrets_decrypt_failed");
        HandlerError::Decrypt(e)
    })?;

    let values: HashMap<String, String> = serde_json::from_slice(&plaintext).map_err(|e| {
        warn!(
            key_id = %key_id,
            plaintext_length = plaintext.len(),
            error = %e,
            "secrets_malformed"
        );
        HandlerError::MalformedSecrets(e)
    })?;

    info!(
        key_id = %key_id,
        secret_count = values.len(),
        has_signing_secret = values.contains_key(SIGNING_SECRET_KEY),
        "secrets_decrypted"
    );

    Ok(Secrets(values))
}

/// Serialize `params` to JSON and seal it under `key_id`.
///
/// Used for provisioning the blob, never on the request path.
pub fn encrypt_secrets(
    kms: &dyn KeyManagement,
    key_id: &str,
    params: &HashMap<String, String>,
) -> Result<String, HandlerError> {
    let plaintext = serde_json::to_vec(params).map_err(HandlerError::MalformedSecrets)?;
    kms.encrypt(key_id, &plaintext).map_err(HandlerError::Encrypt)
}
