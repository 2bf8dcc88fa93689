//! Fixed-budget retry loop for page fetches.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{AppError, Result};

/// Growth of the pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * 2^(attempt - 1)`: 1s, 2s, 4s with the default base.
    Exponential,
    /// `base * attempt`: 1s, 2s, 3s with the default base.
    Linear,
}

impl FromStr for Backoff {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exponential" => Ok(Backoff::Exponential),
            "linear" => Ok(Backoff::Linear),
            other => Err(AppError::Config(format!(
                "RETRY_BACKOFF must be 'exponential' or 'linear', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::config::RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(crate::config::RETRY_BASE_DELAY_MS),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Pause after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self.backoff {
            Backoff::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt - 1)),
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
        }
    }

    /// Run `op` until it succeeds or `max_attempts` calls have failed.
    ///
    /// Only fetch errors are retried; anything else returns at once. No pause
    /// follows the final failure. Exhaustion is reported as
    /// [`AppError::RetriesExhausted`] wrapping the last error.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(label, attempt, "Succeeded after {attempt} attempts");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_fetch_error() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    warn!(label, attempt, max_attempts, "Final attempt failed: {e}");
                    return Err(AppError::RetriesExhausted {
                        attempts: attempt,
                        last_error: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        label,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt {attempt}/{max_attempts} failed: {e}; retrying in {}ms",
                        delay.as_millis(),
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
