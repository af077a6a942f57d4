//! HTTP endpoint handlers.
//!
//! The HTTP request is converted into the same [`GatewayRequest`] an API
//! gateway would deliver, so the handler behaves identically behind either.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::gateway::{GatewayRequest, GatewayResponse};
use crate::handler::SlackHandler;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<SlackHandler>,
}

impl AppState {
    pub fn new(handler: SlackHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Slack Events API
// =============================================================================

/// Slack Events API endpoint.
///
/// Runs the synchronous handler on the blocking pool and returns its
/// response unchanged.
pub async fn slack_events(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    let request = to_gateway_request(&method, &uri, &headers, query, body);
    let handler = Arc::clone(&state.handler);

    match tokio::task::spawn_blocking(move || handler.respond(&request)).await {
        Ok(response) => into_http_response(response),
        Err(e) => {
            error!(error = %e, "slack_handler_task_failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Build the gateway view of an HTTP request.
pub fn to_gateway_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: String,
) -> GatewayRequest {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (canonical_header_name(name.as_str()), v.to_string()))
        })
        .collect();

    GatewayRequest {
        resource: uri.path().to_string(),
        path: uri.path().to_string(),
        http_method: method.as_str().to_string(),
        headers,
        query_string_parameters: query,
        body,
        is_base64_encoded: false,
    }
}

/// Re-case a lowercased HTTP/2-style header name: `x-slack-signature` → `X-Slack-Signature`.
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Map a [`GatewayResponse`] onto an HTTP response.
pub fn into_http_response(response: GatewayResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut http = Response::new(Body::from(response.body));
    *http.status_mut() = status;

    for (name, value) in response.headers {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                http.headers_mut().insert(name, value);
            }
            _ => error!("gateway_response_header_invalid"),
        }
    }

    http
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerConfig;
    use crate::signature::{sign, system_clock};

    const SECRET: &str = "web-test-secret";

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("x-slack-signature"), "X-Slack-Signature");
        assert_eq!(
            canonical_header_name("x-slack-request-timestamp"),
            "X-Slack-Request-Timestamp"
        );
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
        assert_eq!(canonical_header_name("HOST"), "Host");
    }

    #[test]
    fn test_to_gateway_request() {
        let mut headers = HeaderMap::new();
        headers.insert("x-slack-signature", HeaderValue::from_static("v0=abc"));
        let uri: Uri = "/slack/events?kms_data=blob".parse().unwrap();
        let query = HashMap::from([("kms_data".to_string(), "blob".to_string())]);

        let req = to_gateway_request(&Method::POST, &uri, &headers, query, "{}".to_string());

        assert_eq!(req.http_method, "POST");
        assert_eq!(req.path, "/slack/events");
        assert_eq!(req.header("X-Slack-Signature"), "v0=abc");
        assert_eq!(req.query_param("kms_data"), Some("blob"));
        assert_eq!(req.body, "{}");
    }

    #[test]
    fn test_into_http_response() {
        let res = into_http_response(GatewayResponse::ok_json(r#"{"challenge":"x"}"#.to_string()));
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/json");

        let res = into_http_response(GatewayResponse::internal_error());
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_slack_events_challenge() {
        let state = AppState::new(SlackHandler::new(HandlerConfig {
            signing_secret: Some(SECRET.to_string()),
            ..Default::default()
        }));
        let body = r#"{"challenge":"abc","type":"url_verification"}"#.to_string();
        let timestamp = system_clock().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-slack-request-timestamp",
            HeaderValue::from_str(&timestamp).unwrap(),
        );
        headers.insert(
            "x-slack-signature",
            HeaderValue::from_str(&sign(SECRET, &timestamp, &body)).unwrap(),
        );

        let res = slack_events(
            State(state),
            Method::POST,
            "/slack/events".parse().unwrap(),
            headers,
            Query(HashMap::new()),
            body,
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"challenge":"abc"}"#);
    }

    #[tokio::test]
    async fn test_slack_events_unsigned() {
        let state = AppState::new(SlackHandler::new(HandlerConfig {
            signing_secret: Some(SECRET.to_string()),
            ..Default::default()
        }));

        let res = slack_events(
            State(state),
            Method::POST,
            "/slack/events".parse().unwrap(),
            HeaderMap::new(),
            Query(HashMap::new()),
            r#"{"challenge":"abc","type":"url_verification"}"#.to_string(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
