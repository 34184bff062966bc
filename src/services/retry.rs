//! Bounded retry with exponential backoff for outbound HTTP calls.
//!
//! Retries timeouts, connection failures, 5xx, 408 and 429. Never retries
//! other 4xx responses (an unknown city will not appear on a second try).

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};

const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
const DEFAULT_MAX_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 means a single try.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one.
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as u64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

pub fn classify_error(error: &reqwest::Error) -> RetryDecision {
    if error.is_timeout() || error.is_connect() {
        return RetryDecision::Retry;
    }
    match error.status() {
        Some(status) => classify_status(status),
        None => RetryDecision::NoRetry,
    }
}

pub fn classify_status(status: StatusCode) -> RetryDecision {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        RetryDecision::Retry
    } else {
        RetryDecision::NoRetry
    }
}

/// Run `operation` until it yields a non-retryable outcome or the policy is
/// exhausted. The last response (even a retryable status) or error is returned.
pub async fn send_with_retry<F, Fut>(
    policy: RetryPolicy,
    label: &str,
    operation: F,
) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let result = operation().await;

        let decision = match &result {
            Ok(response) => classify_status(response.status()),
            Err(e) => classify_error(e),
        };
        if decision == RetryDecision::NoRetry || attempt >= policy.max_retries {
            if attempt > 0 && result.is_ok() {
                tracing::debug!("{}: finished after {} retries", label, attempt);
            }
            return result;
        }

        match &result {
            Ok(response) => tracing::warn!(
                "{}: retryable status {} on attempt {} of {}",
                label,
                response.status(),
                attempt + 1,
                policy.max_retries + 1
            ),
            Err(e) => tracing::warn!(
                "{}: retryable error on attempt {} of {}: {}",
                label,
                attempt + 1,
                policy.max_retries + 1,
                e
            ),
        }

        tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
        attempt += 1;
    }
}
