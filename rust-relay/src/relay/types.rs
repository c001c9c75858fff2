//! Request-scoped values that flow through a delivery.

use axum::body::Bytes;
use axum::http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::error::DeliveryError;

/// Content type assumed when the inbound request does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// The parts of an inbound webhook that survive into a delivery.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub content_type: Option<HeaderValue>,
    pub signature: Option<HeaderValue>,
    /// Opaque payload, never parsed.
    pub body: Bytes,
}

impl InboundRequest {
    /// Capture the method, the two relayed headers and the raw body.
    pub fn capture(
        method: Method,
        headers: &HeaderMap,
        signature_header: &HeaderName,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            content_type: headers.get(CONTENT_TYPE).cloned(),
            signature: headers.get(signature_header).cloned(),
            body,
        }
    }
}

/// One logical delivery. Headers and body stay fixed across every hop; only
/// the target and the hop counter move.
#[derive(Debug, Clone)]
pub struct ForwardAttempt {
    pub target_url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub hop_count: u32,
}

impl ForwardAttempt {
    /// Build the forwarding header set: exactly `Content-Type` and the
    /// signature header, each copied verbatim or defaulted.
    pub fn from_inbound(
        target_url: Url,
        inbound: InboundRequest,
        signature_header: &HeaderName,
    ) -> Self {
        let mut headers = HeaderMap::with_capacity(2);

        headers.insert(
            CONTENT_TYPE,
            inbound
                .content_type
                .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
        );
        headers.insert(
            signature_header.clone(),
            inbound
                .signature
                .unwrap_or_else(|| HeaderValue::from_static("")),
        );

        Self {
            target_url,
            headers,
            body: inbound.body,
            hop_count: 0,
        }
    }
}

/// Result of a delivery chain. Only logged, never returned to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayOutcome {
    pub final_status: Option<u16>,
    pub hops_followed: u32,
    pub failed: bool,
    pub error_detail: Option<String>,
}

impl RelayOutcome {
    pub fn delivered(status: u16, hops_followed: u32) -> Self {
        Self {
            final_status: Some(status),
            hops_followed,
            failed: false,
            error_detail: None,
        }
    }

    pub fn failed(final_status: Option<u16>, hops_followed: u32, error: &DeliveryError) -> Self {
        Self {
            final_status,
            hops_followed,
            failed: true,
            error_detail: Some(error.to_string()),
        }
    }

    /// Physical HTTP calls that received a response or failed.
    pub fn calls(&self) -> u32 {
        self.hops_followed + 1
    }
}
