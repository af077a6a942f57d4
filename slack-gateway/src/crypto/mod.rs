//! Secrets sealing for per-tenant Slack credentials.
//!
//! The encrypted blob arrives as a query parameter on every request and is
//! opened with a [`KeyManagement`] backend into a request-scoped [`Secrets`] map.

pub mod envelope;
pub mod kms;

pub use envelope::{decrypt_secrets, encrypt_secrets, Secrets, SIGNING_SECRET_KEY, TOKEN_KEY};
pub use kms::{KeyManagement, KmsError, LocalKms};
