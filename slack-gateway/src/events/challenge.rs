//! URL verification handshake.
//!
//! Slack sends a `challenge` token when the request URL is configured and
//! expects it echoed back verbatim.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::HandlerError;
use crate::gateway::GatewayResponse;

/// Body of the handshake reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeResponse {
    #[serde(default)]
    pub challenge: String,
}

/// Echo the `challenge` field of `body` as `{"challenge": ...}`.
pub fn respond_challenge(body: &str) -> Result<GatewayResponse, HandlerError> {
    let request: ChallengeResponse = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, body_length = body.len(), "challenge_parse_failed");
        HandlerError::Parse(e)
    })?;

    let reply = serde_json::to_string(&ChallengeResponse {
        challenge: request.challenge,
    })?;

    info!(response_length = reply.len(), "challenge_response_ok");

    Ok(GatewayResponse::ok_json(reply))
}
