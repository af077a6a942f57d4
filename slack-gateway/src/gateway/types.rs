//! Request and response shapes exchanged with the API gateway.
//!
//! These mirror the API Gateway proxy integration JSON so that events
//! captured from a real deployment deserialize unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Inbound request as delivered by the gateway.
///
/// Header lookups are exact: names are kept in whatever case the gateway
/// delivered them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub http_method: String,
    #[serde(default, deserialize_with = "nullable_map")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl GatewayRequest {
    /// Header value, or an empty string when absent.
    pub fn header(&self, name: &str) -> &str {
        self.headers.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_string_parameters.get(name).map(String::as_str)
    }
}

/// Response handed back to the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl GatewayResponse {
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code,
            ..Default::default()
        }
    }

    /// 200 with an empty body.
    pub fn ok() -> Self {
        Self::with_status(200)
    }

    /// 200 with a JSON body.
    pub fn ok_json(body: String) -> Self {
        Self {
            status_code: 200,
            headers: HashMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body,
        }
    }

    pub fn internal_error() -> Self {
        Self::with_status(500)
    }
}

fn nullable_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
