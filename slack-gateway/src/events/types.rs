//! Slack Events API envelope types and parser.
//!
//! Only the outer envelope is modeled. Inner events (`message`,
//! `channel_created`, ...) are passed to the event handler as a type tag
//! plus the raw JSON fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::HandlerError;

/// Outer `type` of the one-time endpoint ownership handshake.
pub const URL_VERIFICATION: &str = "url_verification";

/// Outer `type` of a wrapped platform event.
pub const CALLBACK_EVENT: &str = "event_callback";

/// Parsed Events API request body.
#[derive(Debug, Clone)]
pub struct EventsApiEvent {
    pub token: String,
    pub team_id: String,
    pub api_app_id: String,
    /// Outer `type` discriminator, exactly as sent.
    pub event_type: String,
    pub data: EventData,
}

/// Payload selected by the outer `type`.
#[derive(Debug, Clone)]
pub enum EventData {
    UrlVerification(ChallengeRequest),
    Callback(Box<CallbackEvent>),
    /// Any other outer `type`; the raw body is kept for diagnostics.
    Unhandled(Value),
}

/// Fields shared by every envelope.
#[derive(Debug, Deserialize)]
struct EnvelopeHeader {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    team_id: String,
    #[serde(default)]
    api_app_id: String,
}

/// `url_verification` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub challenge: String,
}

/// `event_callback` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackEvent {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub api_app_id: String,
    pub event: InnerEvent,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub event_time: i64,
    #[serde(default)]
    pub authed_users: Vec<String>,
}

/// The wrapped platform event, left uninterpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnerEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl InnerEvent {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn event_ts(&self) -> Option<&str> {
        self.field("event_ts").and_then(Value::as_str)
    }

    /// Deserialize the raw fields into a caller-defined event type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

/// Parse a verified request body into an [`EventsApiEvent`].
///
/// Fails only on malformed JSON or a missing/invalid outer `type`. An
/// unrecognized outer `type` is returned as [`EventData::Unhandled`].
pub fn parse_event(body: &str) -> Result<EventsApiEvent, HandlerError> {
    let value: Value = serde_json::from_str(body)?;
    let header = EnvelopeHeader::deserialize(&value)?;

    let data = match header.event_type.as_str() {
        URL_VERIFICATION => EventData::UrlVerification(ChallengeRequest::deserialize(&value)?),
        CALLBACK_EVENT => EventData::Callback(Box::new(CallbackEvent::deserialize(&value)?)),
        _ => EventData::Unhandled(value),
    };

    info!(
        event_type = %header.event_type,
        team_id = %header.team_id,
        api_app_id = %header.api_app_id,
        "event_parsed"
    );

    Ok(EventsApiEvent {
        token: header.token,
        team_id: header.team_id,
        api_app_id: header.api_app_id,
        event_type: header.event_type,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALLBACK_BODY: &str = r#"
    {
        "token": "xxxxxxxxxx",
        "team_id": "T0001",
        "api_app_id": "A0001",
        "event": {
            "type": "channel_created",
            "channel": {
                "id": "C0001",
                "is_channel": true,
                "name": "test",
                "name_normalized": "test",
                "created": 1535696707,
                "creator": "U0001",
                "is_shared": false,
                "is_org_shared": false
            },
            "event_ts": "1535696707.000100"
        },
        "type": "event_callback",
        "event_id": "Ev0001",
        "event_time": 1535696707,
        "authed_users": ["U0001"]
    }"#;

    #[test]
    fn test_parse_url_verification() {
        let event = parse_event(
            r#"{"token":"xxxxxx","challenge":"xxxxxxxxxxx","type":"url_verification"}"#,
        )
        .unwrap();

        assert_eq!(event.event_type, URL_VERIFICATION);
        assert_eq!(event.token, "xxxxxx");
        match event.data {
            EventData::UrlVerification(req) => assert_eq!(req.challenge, "xxxxxxxxxxx"),
            other => panic!("Expected UrlVerification, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_callback() {
        let event = parse_event(CALLBACK_BODY).unwrap();

        assert_eq!(event.event_type, CALLBACK_EVENT);
        assert_eq!(event.team_id, "T0001");
        let EventData::Callback(cb) = event.data else {
            panic!("Expected Callback variant");
        };
        assert_eq!(cb.event_id, "Ev0001");
        assert_eq!(cb.event_time, 1535696707);
        assert_eq!(cb.authed_users, vec!["U0001".to_string()]);
        assert_eq!(cb.event.event_type, "channel_created");
        assert_eq!(cb.event.event_ts(), Some("1535696707.000100"));
        assert_eq!(cb.event.field("channel").unwrap()["name"], "test");
        assert!(cb.event.field("type").is_none());
    }

    #[test]
    fn test_inner_event_decode() {
        #[derive(Deserialize)]
        struct Channel {
            id: String,
            name: String,
        }
        #[derive(Deserialize)]
        struct ChannelCreated {
            channel: Channel,
        }

        let event = parse_event(CALLBACK_BODY).unwrap();
        let EventData::Callback(cb) = event.data else {
            panic!("Expected Callback variant");
        };
        let created: ChannelCreated = cb.event.decode().unwrap();
        assert_eq!(created.channel.id, "C0001");
        assert_eq!(created.channel.name, "test");
    }

    #[test]
    fn test_parse_unknown_type_is_not_an_error() {
        let body = CALLBACK_BODY.replace(r#""type": "event_callback""#, r#""type": "hoge""#);
        let event = parse_event(&body).unwrap();

        assert_eq!(event.event_type, "hoge");
        assert!(matches!(event.data, EventData::Unhandled(_)));
    }

    #[test]
    fn test_parse_callback_without_inner_event() {
        let err = parse_event(r#"{"type":"event_callback","event_id":"Ev1"}"#).unwrap_err();
        assert!(matches!(err, HandlerError::Parse(_)));
    }

    #[test]
    fn test_parse_missing_type() {
        let err = parse_event(r#"{"token":"x"}"#).unwrap_err();
        assert!(matches!(err, HandlerError::Parse(_)));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_event(r#"{"type":"#).unwrap_err();
        assert!(matches!(err, HandlerError::Parse(_)));
    }
}
