// src/ai/retry.rs

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::error::ExamError;

/// Bounded retry with exponential backoff and a per-attempt timeout.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    /// Timeouts count as transient failures.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ExamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExamError>>,
    {
        let max_attempts = self.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let outcome = match timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(ExamError::transient(format!(
                    "timed out after {:?}",
                    self.timeout
                ))),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        "{} attempt {}/{} failed: {}. Retrying in {:?}",
                        label,
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!("{} failed after {} attempt(s): {}", label, attempt, e);
                    return Err(e);
                }
            }
        }

        Err(ExamError::generation("Max retries exceeded"))
    }
}
