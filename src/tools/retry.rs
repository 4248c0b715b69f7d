//! Retry manager with exponential backoff
//!
//! Bounded retry strategy for transient network failures:
//! - Default: 3 attempts (one call plus two retries)
//! - Binary exponential delay with ±25% jitter, capped
//! - Permanent errors are returned immediately

use crate::errors::{AgentError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Default number of attempts (initial call + 2 retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff
const BASE_DELAY_MS: u64 = 1000;

/// Maximum delay cap
const MAX_DELAY_MS: u64 = 8000;

/// Retry manager with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryManager {
    /// Maximum attempts including the first one
    max_attempts: u32,

    /// Base delay in milliseconds
    base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    max_delay_ms: u64,

    /// Enable jitter
    enable_jitter: bool,
}

impl Default for RetryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryManager {
    /// Create new retry manager with default settings
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Create retry manager with custom settings
    pub fn with_config(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Execute operation with retry logic.
    ///
    /// On exhaustion the last error is returned unchanged so the caller
    /// sees the real cause.
    pub async fn execute_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable(&e) {
                        return Err(e);
                    }

                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }

                    let delay = self.calculate_delay(attempt - 1);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying");
                    sleep(delay).await;
                }
            }
        }
    }

    /// Calculate delay before the retry following `attempt` (0-based)
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponential_delay = self.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        let final_delay = if self.enable_jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((delay_ms as i64) + random_jitter as i64).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Get max attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Check if error is transient
pub fn is_retryable(error: &AgentError) -> bool {
    match error {
        AgentError::Timeout { .. } => true,
        AgentError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        AgentError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
        AgentError::EngineError(_) => true,
        AgentError::Generic(_) => true,

        AgentError::InvalidBatch(_) => false,
        AgentError::InvalidInput(_) => false,
        AgentError::ConfigError(_) => false,
        AgentError::SerializationError(_) => false,
        _ => false,
    }
}
