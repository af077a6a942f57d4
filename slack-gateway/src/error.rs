//! Errors surfaced by the request handler.
//!
//! Every variant maps to a bodiless 500 response; callers that need finer
//! detail inspect the error value itself.

use thiserror::Error;

use crate::crypto::KmsError;
use crate::gateway::GatewayResponse;
use crate::signature::SignatureError;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to decrypt secrets: {0}")]
    Decrypt(#[source] KmsError),

    #[error("failed to encrypt secrets: {0}")]
    Encrypt(#[source] KmsError),

    #[error("malformed secrets: {0}")]
    MalformedSecrets(#[source] serde_json::Error),

    #[error("query parameter '{0}' not found")]
    MissingParameter(String),

    #[error(transparent)]
    InvalidSignature(#[from] SignatureError),

    #[error(transparent)]
    Parse(#[from] serde_json::Error),

    #[error("unknown Events API type: {0}")]
    UnknownEventType(String),

    #[error("internal error: {0}")]
    InternalConsistency(String),

    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn status_code(&self) -> u16 {
        500
    }

    /// Response sent to the webhook source. Carries no body.
    pub fn to_response(&self) -> GatewayResponse {
        GatewayResponse::with_status(self.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_event_type_names_the_type() {
        let err = HandlerError::UnknownEventType("hoge".to_string());
        assert_eq!(err.to_string(), "unknown Events API type: hoge");
    }

    #[test]
    fn test_invalid_signature_message() {
        let err = HandlerError::from(SignatureError::Mismatch);
        assert_eq!(err.to_string(), "Invalid request signature");
    }

    #[test]
    fn test_every_error_maps_to_bodiless_500() {
        let errors = [
            HandlerError::MissingParameter("kms_data".to_string()),
            HandlerError::Decrypt(KmsError::DecryptionFailed),
            HandlerError::InternalConsistency("x".to_string()),
            HandlerError::Callback(anyhow::anyhow!("boom")),
        ];
        for err in errors {
            let res = err.to_response();
            assert_eq!(res.status_code, 500);
            assert!(res.body.is_empty());
        }
    }
}
