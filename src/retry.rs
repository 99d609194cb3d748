//! Forwarding loop with challenge detection and clearance refresh.
//!
//! Each attempt builds a new upstream client from whatever clearance is current.
//! A 403 from the backend is treated as a bot-challenge rejection: the loop asks
//! the upstream for a new clearance, stores it when one comes back, and tries
//! again after an exponential backoff. Other failures are recorded and retried
//! the same way. Once every attempt is used, the last recorded error is
//! surfaced.

use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::UpstreamConfig;
use crate::error::{ProxyError, Result};
use crate::metrics::RetryMetrics;
use crate::models::chutes::ChutesRequest;
use crate::provider::{Upstream, UpstreamResponse};
use crate::state::ClearanceStore;

/// Status the challenge layer answers with when it blocks a request
pub const CHALLENGE_STATUS: StatusCode = StatusCode::FORBIDDEN;

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt
    ///
    /// `None` after the last attempt: there is nothing left to wait for.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(16);
        Some(self.base_delay.saturating_mul(1 << exponent))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl From<&UpstreamConfig> for RetryPolicy {
    fn from(config: &UpstreamConfig) -> Self {
        Self::new(config.max_retries, config.backoff_base())
    }
}

pub struct RetryController {
    upstream: Arc<dyn Upstream>,
    clearance: ClearanceStore,
    policy: RetryPolicy,
    metrics: Arc<RetryMetrics>,
}

impl RetryController {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        clearance: ClearanceStore,
        policy: RetryPolicy,
        metrics: Arc<RetryMetrics>,
    ) -> Self {
        Self {
            upstream,
            clearance,
            policy,
            metrics,
        }
    }

    /// Forward `request` until the backend accepts it or the budget runs out
    ///
    /// On success the response body is returned unread, ready for streaming.
    pub async fn send(&self, request: &ChutesRequest) -> Result<UpstreamResponse> {
        let max_attempts = self.policy.max_attempts;
        let mut last_error: Option<String> = None;

        for attempt in 1..=max_attempts {
            let current = self.clearance.get();
            let clearance = current.as_deref().map(String::as_str);

            self.metrics.record_attempt();
            info!(
                upstream = self.upstream.name(),
                attempt,
                max_attempts,
                has_clearance = clearance.is_some(),
                "Forwarding chat request"
            );

            match self.upstream.post_chat(request, clearance).await {
                Ok(response) if response.status.is_success() => {
                    self.metrics.record_success();
                    info!(attempt, status = %response.status, "Upstream accepted request");
                    return Ok(response);
                }
                Ok(response) if response.status == CHALLENGE_STATUS => {
                    self.metrics.record_challenge();
                    warn!(attempt, "Challenge rejection, clearance needs refresh");

                    let status = response.status;
                    let body = response.text().await;
                    last_error = Some(status_error(status, &body));

                    if self.upstream.supports_refresh() {
                        self.refresh(clearance).await;
                    }
                }
                Ok(response) => {
                    self.metrics.record_upstream_error();
                    let status = response.status;
                    let body = response.text().await;
                    let message = status_error(status, &body);
                    error!(attempt, error = %message, "Request failed");
                    last_error = Some(message);
                }
                Err(e) => {
                    self.metrics.record_transport_failure();
                    error!(attempt, error = %e, "Attempt failed");
                    last_error = Some(e.to_string());
                }
            }

            if let Some(delay) = self.policy.delay_after(attempt) {
                info!(delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }
        }

        self.metrics.record_exhausted();
        let last_error = last_error.unwrap_or_else(|| "no attempts were made".to_string());
        error!(attempts = max_attempts, last_error = %last_error, "All retries failed");

        Err(ProxyError::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    /// Ask the upstream for a new clearance and store it when one arrives
    async fn refresh(&self, current: Option<&str>) {
        match self.upstream.fetch_clearance(current).await {
            Some(fresh) => {
                self.metrics.record_refresh(true);
                self.clearance.set(fresh);
            }
            None => {
                self.metrics.record_refresh(false);
                warn!("Clearance refresh failed, retrying with the previous clearance");
            }
        }
    }
}

fn status_error(status: StatusCode, body: &str) -> String {
    format!("Status code: {}, Response: {}", status.as_u16(), body)
}
