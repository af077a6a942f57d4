//! Configuration module for environment variable parsing.

use std::env;
use tracing::warn;

use crate::handler::{HandlerConfig, DEFAULT_KMS_PARAM};
use crate::signature::DEFAULT_MAX_AGE_SECS;

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Slack signing secret, used when KMS is disabled
    pub signing_secret: Option<String>,

    /// Read the signing secret from the sealed query parameter
    pub kms_enabled: bool,

    /// Master key identifier
    pub kms_key_id: String,

    /// Query parameter carrying the sealed secrets blob
    pub kms_param: String,

    /// Master key (hex or base64) for the local key-management backend
    pub kms_master_key: Option<String>,

    /// Maximum age in seconds for Slack request timestamps
    pub signature_max_age: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_or("PORT", 8080),

            signing_secret: non_empty("SLACK_SIGNING_SECRET"),

            kms_enabled: parse_bool("KMS_ENABLED"),

            kms_key_id: env::var("KMS_KEY_ID").unwrap_or_default(),

            kms_param: non_empty("KMS_PARAM").unwrap_or_else(|| DEFAULT_KMS_PARAM.to_string()),

            kms_master_key: non_empty("KMS_MASTER_KEY"),

            signature_max_age: parse_or("SIGNATURE_MAX_AGE", DEFAULT_MAX_AGE_SECS),
        }
    }

    /// Settings consumed by the request handler.
    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            signing_secret: self.signing_secret.clone(),
            kms_enabled: self.kms_enabled,
            kms_key_id: self.kms_key_id.clone(),
            kms_param: self.kms_param.clone(),
            signature_max_age: self.signature_max_age,
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("signing_secret_set", &self.signing_secret.is_some())
            .field("kms_enabled", &self.kms_enabled)
            .field("kms_key_id", &self.kms_key_id)
            .field("kms_param", &self.kms_param)
            .field("kms_master_key_set", &self.kms_master_key.is_some())
            .field("signature_max_age", &self.signature_max_age)
            .finish()
    }
}

/// Parse a variable, falling back to `default` when unset or invalid.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a boolean flag. Accepts `1`, `true`, `yes`, `on` (any case).
fn parse_bool(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
