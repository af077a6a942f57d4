//! Slack request signature verification.
//!
//! Slack signs every Events API request using HMAC-SHA256.
//! Reference: https://api.slack.com/authentication/verifying-requests-from-slack

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Version prefix of the signing scheme, used in both the base string and the header.
pub const SIGNATURE_VERSION: &str = "v0";

/// Header carrying the Unix timestamp the request was signed at.
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

/// Header carrying the `v0=<hex>` signature.
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Default replay window in seconds.
pub const DEFAULT_MAX_AGE_SECS: u64 = 300;

/// Source of the current Unix time in seconds.
pub type Clock = fn() -> i64;

/// Wall-clock time source.
pub fn system_clock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Reasons a request signature is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("no signing secret configured")]
    EmptySecret,

    #[error("invalid request timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("request timestamp is {age}s away from now (max {max_age}s)")]
    Stale { age: u64, max_age: u64 },

    #[error("Invalid request signature")]
    Mismatch,
}

/// Compute the `v0=<hex>` signature for a request.
///
/// The base string is `v0:<timestamp>:<body>` keyed with the signing secret.
pub fn sign(secret: &str, timestamp: &str, body: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(format!("{SIGNATURE_VERSION}:{timestamp}:{body}").as_bytes());
    format!("{SIGNATURE_VERSION}={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a Slack request signature.
///
/// # Arguments
///
/// * `body` - The raw request body, exactly as received
/// * `secret` - The Slack app signing secret
/// * `timestamp` - The `X-Slack-Request-Timestamp` header value
/// * `signature` - The `X-Slack-Signature` header value
/// * `max_age_seconds` - Maximum distance between `timestamp` and `now`
/// * `now` - Current Unix time source
pub fn verify(
    body: &str,
    secret: &str,
    timestamp: &str,
    signature: &str,
    max_age_seconds: u64,
    now: Clock,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        warn!(
            has_timestamp = !timestamp.is_empty(),
            has_signature = !signature.is_empty(),
            "signature_secret_missing"
        );
        return Err(SignatureError::EmptySecret);
    }

    let request_time: i64 = timestamp.trim().parse().map_err(|_| {
        warn!(timestamp = %timestamp, "signature_invalid_timestamp");
        SignatureError::InvalidTimestamp(timestamp.to_string())
    })?;

    let current_time = now();
    let age = current_time.abs_diff(request_time);

    if age > max_age_seconds {
        warn!(
            request_time = request_time,
            current_time = current_time,
            age_seconds = age,
            max_age_seconds = max_age_seconds,
            "signature_stale"
        );
        return Err(SignatureError::Stale {
            age,
            max_age: max_age_seconds,
        });
    }

    let expected_signature = sign(secret, timestamp, body);

    if !constant_time_compare(&expected_signature, signature) {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            "signature_mismatch"
        );
        return Err(SignatureError::Mismatch);
    }

    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
