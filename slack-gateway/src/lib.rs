//! Slack Gateway - signed Slack Events API webhook handler.
//!
//! This library provides the request pipeline shared by the two binaries:
//! - `slack-gateway`: HTTP server exposing the handler
//! - `slack-gateway-seal`: seals per-tenant secrets into a query-parameter blob
//!
//! ## Architecture
//!
//! ```text
//! Gateway request → unseal secrets → verify signature → parse event → route → Gateway response
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod gateway;
pub mod handler;
pub mod signature;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use crypto::{
    decrypt_secrets, encrypt_secrets, KeyManagement, KmsError, LocalKms, Secrets,
    SIGNING_SECRET_KEY, TOKEN_KEY,
};
pub use error::HandlerError;
pub use events::{parse_event, respond_challenge, CallbackEvent, EventData, EventsApiEvent};
pub use gateway::{GatewayRequest, GatewayResponse};
pub use handler::{
    handler_fn, DefaultEventHandler, EventHandler, HandlerConfig, RequestContext, SlackHandler,
    DEFAULT_KMS_PARAM,
};
pub use signature::{sign, verify, SignatureError};
