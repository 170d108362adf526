use serde::{Deserialize, Serialize};
use spaceout_core::StoreError;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Bounded retry for transient store failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    50
}

fn default_backoff_max_ms() -> u64 {
    1_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn no_retries() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Exponential backoff with a small deterministic spread so that
    /// sessions retrying together do not stay in lockstep.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.backoff_base_ms.max(1) as f64;
        let max = self.backoff_max_ms.max(1) as f64;
        let exp = attempt.min(30) as i32;
        let without_jitter = (base * 2f64.powi(exp)).min(max);
        let jitter_factor = 0.9 + (attempt % 3) as f64 * 0.05;
        Duration::from_millis((without_jitter * jitter_factor) as u64)
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// retry budget is spent.
    pub async fn run<T, F, Fut>(&self, op: &'static str, mut f: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "Store call {} failed (attempt {}/{}), retrying in {:?}: {}",
                        op,
                        attempt + 1,
                        self.max_retries + 1,
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!("Store call {} failed after {} attempt(s): {}", op, attempt + 1, err);
                    return Err(err);
                }
            }
        }
    }
}
