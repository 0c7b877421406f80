//! Timeout guard for the AI modifier call.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::{ConfigError, GenerationError};

/// Default budget for one AI generation.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    duration: Duration,
}

impl TimeoutPolicy {
    /// Create a timeout policy. The duration must be non-zero and finite.
    pub fn new(duration: Duration) -> Result<Self, ConfigError> {
        if duration.is_zero() || duration == Duration::MAX {
            return Err(ConfigError::InvalidTimeout(duration));
        }
        Ok(Self { duration })
    }

    /// Inspect the configured timeout duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Run `operation`, converting an overrun into [`GenerationError::Timeout`].
    pub async fn execute<T, Fut, Op>(&self, operation: Op) -> Result<T, GenerationError>
    where
        Fut: Future<Output = Result<T, GenerationError>>,
        Op: FnOnce() -> Fut,
    {
        let start = Instant::now();

        match tokio::time::timeout(self.duration, operation()).await {
            Ok(result) => result,
            Err(_) => {
                let elapsed = start.elapsed();
                tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    timeout_ms = self.duration.as_millis() as u64,
                    "AI generation timed out"
                );
                Err(GenerationError::Timeout { elapsed, timeout: self.duration })
            }
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self { duration: DEFAULT_GENERATION_TIMEOUT }
    }
}
