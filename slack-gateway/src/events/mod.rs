//! Slack Events API payloads.
//!
//! ```text
//! body → parse_event() → url_verification → respond_challenge()
//!                      → event_callback   → EventHandler
//! ```

pub mod challenge;
pub mod types;

pub use challenge::{respond_challenge, ChallengeResponse};
pub use types::{
    parse_event, CallbackEvent, ChallengeRequest, EventData, EventsApiEvent, InnerEvent,
    CALLBACK_EVENT, URL_VERIFICATION,
};
