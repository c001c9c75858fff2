//! Redirect-following POST delivery.
//!
//! The client never follows redirects on its own: reqwest's default policy
//! turns a redirected POST into a GET and drops the body. Each hop here is a
//! fresh POST with the original headers and bytes.

use std::time::{Duration, Instant};

use reqwest::{header::LOCATION, redirect::Policy, Client, Response};
use tracing::{error, info, warn};
use url::Url;

use super::types::{ForwardAttempt, RelayOutcome};
use crate::error::DeliveryError;

/// Delivers a [`ForwardAttempt`] to the collector, hop by hop.
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    max_redirects: u32,
    hop_timeout: Duration,
}

impl Forwarder {
    /// Create a forwarder with redirects disabled on the underlying client.
    pub fn new(max_redirects: u32, hop_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(Policy::none())
            .connect_timeout(hop_timeout)
            .pool_max_idle_per_host(16)
            .build()?;

        Ok(Self {
            client,
            max_redirects,
            hop_timeout,
        })
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// Run the delivery chain to completion.
    ///
    /// Hops are strictly sequential. The chain ends on the first non-3xx
    /// response, on a 3xx without `Location`, when `max_redirects` hops have
    /// been followed, or on any transport error. Every ending is reported in
    /// the returned outcome; nothing is raised.
    pub async fn deliver(&self, mut attempt: ForwardAttempt) -> RelayOutcome {
        let started = Instant::now();
        let body_length = attempt.body.len();

        let outcome = loop {
            let response = match self.send_hop(&attempt).await {
                Ok(response) => response,
                Err(e) => break RelayOutcome::failed(None, attempt.hop_count, &e),
            };

            let status = response.status();
            let code = status.as_u16();

            if !status.is_redirection() {
                break if status.is_success() {
                    RelayOutcome::delivered(code, attempt.hop_count)
                } else {
                    RelayOutcome::failed(
                        Some(code),
                        attempt.hop_count,
                        &DeliveryError::UpstreamStatus(code),
                    )
                };
            }

            let next = match self.next_target(&attempt, &response) {
                Ok(next) => next,
                Err(e) => break RelayOutcome::failed(Some(code), attempt.hop_count, &e),
            };

            info!(
                hop = attempt.hop_count,
                status_code = code,
                location = %next,
                "relay_redirect_followed"
            );

            attempt.target_url = next;
            attempt.hop_count += 1;
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;

        if outcome.failed {
            error!(
                final_status = ?outcome.final_status,
                hops_followed = outcome.hops_followed,
                max_redirects = self.max_redirects(),
                calls = outcome.calls(),
                body_length = body_length,
                elapsed_ms = elapsed_ms,
                error = outcome.error_detail.as_deref().unwrap_or(""),
                "relay_delivery_failed"
            );
        } else {
            info!(
                final_status = ?outcome.final_status,
                hops_followed = outcome.hops_followed,
                max_redirects = self.max_redirects(),
                calls = outcome.calls(),
                body_length = body_length,
                elapsed_ms = elapsed_ms,
                "relay_delivery_complete"
            );
        }

        outcome
    }

    /// Issue one POST for the current hop.
    async fn send_hop(&self, attempt: &ForwardAttempt) -> Result<Response, DeliveryError> {
        info!(
            hop = attempt.hop_count,
            url = %attempt.target_url,
            body_length = attempt.body.len(),
            "relay_hop_sent"
        );

        self.client
            .post(attempt.target_url.clone())
            .headers(attempt.headers.clone())
            .body(attempt.body.clone())
            .timeout(self.hop_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(
                        hop = attempt.hop_count,
                        url = %attempt.target_url,
                        timeout_ms = self.hop_timeout.as_millis() as u64,
                        "relay_hop_timeout"
                    );
                } else {
                    warn!(
                        hop = attempt.hop_count,
                        url = %attempt.target_url,
                        error = %e,
                        "relay_hop_error"
                    );
                }
                DeliveryError::from(e)
            })
    }

    /// Decide where a 3xx response sends the chain next.
    fn next_target(
        &self,
        attempt: &ForwardAttempt,
        response: &Response,
    ) -> Result<Url, DeliveryError> {
        let code = response.status().as_u16();

        let location = response
            .headers()
            .get(LOCATION)
            .ok_or(DeliveryError::RedirectWithoutLocation(code))?;

        if attempt.hop_count >= self.max_redirects {
            return Err(DeliveryError::RedirectLimit(self.max_redirects));
        }

        resolve_location(&attempt.target_url, location.as_bytes())
    }
}

/// Resolve a `Location` value against the URL that produced it.
fn resolve_location(base: &Url, location: &[u8]) -> Result<Url, DeliveryError> {
    let raw = std::str::from_utf8(location)
        .map_err(|_| DeliveryError::InvalidLocation(String::from_utf8_lossy(location).into_owned()))?
        .trim();

    let url = base
        .join(raw)
        .map_err(|e| DeliveryError::InvalidLocation(format!("{raw}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(DeliveryError::InvalidLocation(raw.to_string())),
    }
}
