//! Web server module exposing the handler over plain HTTP.
//!
//! This module provides a thin adapter that:
//! - Receives Slack Events API requests
//! - Converts them to the gateway request shape
//! - Runs the signature-checking handler
//! - Returns the handler's response as-is

pub mod handlers;

pub use handlers::{
    canonical_header_name, health, into_http_response, slack_events, to_gateway_request,
    AppState, HealthResponse,
};
