//! Slack Events API request handler.
//!
//! Every request runs the same pipeline:
//!
//! ```text
//! GatewayRequest → unseal secrets (optional) → verify signature → parse → route
//!                                                                   ├─ url_verification → challenge echo
//!                                                                   ├─ event_callback   → EventHandler
//!                                                                   └─ anything else    → UnknownEventType
//! ```
//!
//! The handler holds no per-request state and can be shared across threads.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::crypto::{decrypt_secrets, KeyManagement, KmsError, Secrets};
use crate::error::HandlerError;
use crate::events::{
    parse_event, respond_challenge, CallbackEvent, EventData, EventsApiEvent, CALLBACK_EVENT,
    URL_VERIFICATION,
};
use crate::gateway::{GatewayRequest, GatewayResponse};
use crate::signature::{self, system_clock, Clock, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Default query parameter carrying the sealed secrets blob.
pub const DEFAULT_KMS_PARAM: &str = "kms_data";

/// Deployment-wide handler settings. Immutable once the handler is built.
#[derive(Clone)]
pub struct HandlerConfig {
    /// Pre-shared signing secret, used when KMS is disabled.
    pub signing_secret: Option<String>,
    /// Read the signing secret from the sealed blob instead.
    pub kms_enabled: bool,
    /// Master key identifier passed to the key-management backend.
    pub kms_key_id: String,
    /// Query parameter holding the sealed blob.
    pub kms_param: String,
    /// Replay window in seconds.
    pub signature_max_age: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            kms_enabled: false,
            kms_key_id: String::new(),
            kms_param: DEFAULT_KMS_PARAM.to_string(),
            signature_max_age: signature::DEFAULT_MAX_AGE_SECS,
        }
    }
}

impl fmt::Debug for HandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerConfig")
            .field("signing_secret_set", &self.signing_secret.is_some())
            .field("kms_enabled", &self.kms_enabled)
            .field("kms_key_id", &self.kms_key_id)
            .field("kms_param", &self.kms_param)
            .field("signature_max_age", &self.signature_max_age)
            .finish()
    }
}

/// Everything an [`EventHandler`] gets to see about one callback request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub request: &'a GatewayRequest,
    pub event: &'a EventsApiEvent,
    pub callback: &'a CallbackEvent,
    /// Secrets unsealed for this request; empty when KMS is disabled.
    pub secrets: &'a Secrets,
}

/// Integrator hook invoked once per verified `event_callback` request.
pub trait EventHandler: Send + Sync {
    fn handle_event(
        &self,
        config: &HandlerConfig,
        ctx: &RequestContext<'_>,
    ) -> anyhow::Result<GatewayResponse>;
}

impl<F> EventHandler for F
where
    F: Fn(&HandlerConfig, &RequestContext<'_>) -> anyhow::Result<GatewayResponse> + Send + Sync,
{
    fn handle_event(
        &self,
        config: &HandlerConfig,
        ctx: &RequestContext<'_>,
    ) -> anyhow::Result<GatewayResponse> {
        self(config, ctx)
    }
}

/// Wrap a closure as an [`EventHandler`], fixing its argument types.
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&HandlerConfig, &RequestContext<'_>) -> anyhow::Result<GatewayResponse> + Send + Sync,
{
    f
}

/// Logs the inner event and acknowledges it with an empty 200.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEventHandler;

impl EventHandler for DefaultEventHandler {
    fn handle_event(
        &self,
        _config: &HandlerConfig,
        ctx: &RequestContext<'_>,
    ) -> anyhow::Result<GatewayResponse> {
        let inner = &ctx.callback.event;

        match inner.event_type.as_str() {
            "message" => info!(
                channel = ?inner.field("channel"),
                user = ?inner.field("user"),
                "message_event_received"
            ),
            "channel_created" => info!(
                channel_name = ?inner.field("channel").and_then(|c| c.get("name")),
                "channel_created_event_received"
            ),
            _ => {}
        }

        info!(
            event_type = %inner.event_type,
            event_id = %ctx.callback.event_id,
            team_id = %ctx.callback.team_id,
            "callback_event_acknowledged"
        );

        Ok(GatewayResponse::ok())
    }
}

/// Verifies, parses and routes Slack Events API requests.
pub struct SlackHandler {
    config: HandlerConfig,
    kms: Option<Arc<dyn KeyManagement>>,
    event_handler: Arc<dyn EventHandler>,
    clock: Clock,
}

impl SlackHandler {
    /// Build a handler, filling in the default blob parameter name, the
    /// [`DefaultEventHandler`] and the system clock.
    pub fn new(mut config: HandlerConfig) -> Self {
        if config.kms_param.is_empty() {
            config.kms_param = DEFAULT_KMS_PARAM.to_string();
        }

        Self {
            config,
            kms: None,
            event_handler: Arc::new(DefaultEventHandler),
            clock: system_clock,
        }
    }

    pub fn with_kms(mut self, kms: Arc<dyn KeyManagement>) -> Self {
        self.kms = Some(kms);
        self
    }

    pub fn with_event_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.event_handler = Arc::new(handler);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Handle a request, collapsing any error into a bodiless 500.
    pub fn respond(&self, request: &GatewayRequest) -> GatewayResponse {
        match self.handle(request) {
            Ok(response) => {
                info!(status_code = response.status_code, "slack_request_completed");
                response
            }
            Err(e) => {
                error!(error = %e, "slack_request_failed");
                e.to_response()
            }
        }
    }

    /// Handle a request.
    ///
    /// On error the caller should answer with [`HandlerError::to_response`].
    pub fn handle(&self, request: &GatewayRequest) -> Result<GatewayResponse, HandlerError> {
        info!(
            method = %request.http_method,
            path = %request.path,
            body_length = request.body.len(),
            has_timestamp = request.headers.contains_key(TIMESTAMP_HEADER),
            has_signature = request.headers.contains_key(SIGNATURE_HEADER),
            "slack_request_received"
        );

        let secrets = self.load_secrets(request)?;
        let signing_secret = if self.config.kms_enabled {
            secrets.signing_secret()
        } else {
            self.config.signing_secret.as_deref().unwrap_or("")
        };

        signature::verify(
            &request.body,
            signing_secret,
            request.header(TIMESTAMP_HEADER),
            request.header(SIGNATURE_HEADER),
            self.config.signature_max_age,
            self.clock,
        )?;

        let event = parse_event(&request.body)?;

        match event.event_type.as_str() {
            URL_VERIFICATION => respond_challenge(&request.body),
            CALLBACK_EVENT => self.dispatch_callback(request, &event, &secrets),
            other => {
                warn!(event_type = %other, "unknown_event_type");
                Err(HandlerError::UnknownEventType(other.to_string()))
            }
        }
    }

    /// Unseal the secrets blob named by `kms_param`, if KMS is enabled.
    fn load_secrets(&self, request: &GatewayRequest) -> Result<Secrets, HandlerError> {
        if !self.config.kms_enabled {
            return Ok(Secrets::default());
        }

        let Some(blob) = request.query_param(&self.config.kms_param) else {
            warn!(param = %self.config.kms_param, "kms_param_missing");
            return Err(HandlerError::MissingParameter(self.config.kms_param.clone()));
        };

        let kms = self.kms.as_deref().ok_or_else(|| {
            HandlerError::Decrypt(KmsError::Service(
                "no key management client configured".to_string(),
            ))
        })?;

        decrypt_secrets(kms, &self.config.kms_key_id, blob)
    }

    fn dispatch_callback(
        &self,
        request: &GatewayRequest,
        event: &EventsApiEvent,
        secrets: &Secrets,
    ) -> Result<GatewayResponse, HandlerError> {
        let EventData::Callback(callback) = &event.data else {
            return Err(HandlerError::InternalConsistency(format!(
                "{} payload is not a callback event",
                event.event_type
            )));
        };

        let ctx = RequestContext {
            request,
            event,
            callback,
            secrets,
        };

        info!(
            inner_type = %callback.event.event_type,
            event_id = %callback.event_id,
            "callback_event_dispatch"
        );

        Ok(self.event_handler.handle_event(&self.config, &ctx)?)
    }
}

impl fmt::Debug for SlackHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackHandler")
            .field("config", &self.config)
            .field("kms_configured", &self.kms.is_some())
            .finish_non_exhaustive()
    }
}
