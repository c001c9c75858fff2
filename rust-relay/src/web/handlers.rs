//! Webhook endpoint handler.
//!
//! The handler is kept on the fast path only:
//! 1. Answer verification probes
//! 2. Capture the body and relayed headers
//! 3. Schedule the delivery in the background
//! 4. Return 200 OK without waiting on the collector

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, FailedToBufferBody},
        State,
    },
    http::{HeaderMap, HeaderName, Method},
};
use tracing::{debug, error, info, warn};

use crate::error::RelayError;
use crate::relay::{BackgroundTasks, ForwardAttempt, Forwarder, InboundRequest};
use crate::Config;

/// Body returned to every accepted request.
pub const OK_BODY: &str = "OK";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forwarder: Forwarder,
    pub tasks: BackgroundTasks,
    pub signature_header: HeaderName,
}

impl AppState {
    pub fn new(config: Config, tasks: BackgroundTasks) -> Result<Self> {
        let signature_header = HeaderName::from_bytes(config.signature_header.as_bytes())
            .with_context(|| format!("Invalid SIGNATURE_HEADER: {}", config.signature_header))?;

        let forwarder = Forwarder::new(config.max_redirects, config.hop_timeout())
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config: Arc::new(config),
            forwarder,
            tasks,
            signature_header,
        })
    }
}

/// Relay endpoint, mounted on every path.
///
/// GET and HEAD are verification probes and are never forwarded. POST is
/// acknowledged at once and relayed in the background. Anything else is
/// rejected with 405.
pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<&'static str, RelayError> {
    match method {
        Method::GET | Method::HEAD => {
            debug!(method = %method, "relay_probe_received");
            return Ok(OK_BODY);
        }
        Method::POST => {}
        other => {
            warn!(method = %other, "relay_method_not_allowed");
            return Err(RelayError::UnsupportedMethod(other));
        }
    }

    let target = state.config.downstream_url().map_err(|e| {
        error!(error = %e, "relay_downstream_unconfigured");
        e
    })?;

    let body = body.map_err(|rejection| match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            warn!(limit = state.config.max_body_bytes, "relay_body_too_large");
            RelayError::PayloadTooLarge(state.config.max_body_bytes)
        }
        other => {
            warn!(error = %other, "relay_body_read_failed");
            RelayError::BodyRead(other.body_text())
        }
    })?;

    let inbound = InboundRequest::capture(method, &headers, &state.signature_header, body);

    info!(
        body_length = inbound.body.len(),
        has_signature = inbound.signature.is_some(),
        has_content_type = inbound.content_type.is_some(),
        "relay_webhook_received"
    );

    let attempt = ForwardAttempt::from_inbound(target, inbound, &state.signature_header);
    let forwarder = state.forwarder.clone();

    state.tasks.spawn(async move {
        forwarder.deliver(attempt).await;
    });

    info!(in_flight = state.tasks.len(), "relay_delivery_scheduled");

    Ok(OK_BODY)
}
