//! Per-identity rate limiting for the AI preview endpoint.
//!
//! This module provides the building blocks:
//! - [`RateLimiter`]: the trait the endpoint and the guarded backend depend on.
//! - [`FixedWindowLimiter`]: the in-memory implementation (N requests per window per identity).
//! - [`Sweeper`]: background task that reclaims memory held by expired windows.
//! - [`RateLimitLayer`]: tower middleware that enforces the limit on HTTP routes.
//!
//! # Architecture
//!
//! Correctness and memory reclamation are separate code paths. `check` treats an expired
//! entry as absent the moment it observes it (lazy expiry), so the window bound holds even if
//! no sweeper is ever started. The sweeper only deletes entries nobody came back for.

use std::time::Duration;

pub mod middleware;
pub mod sweeper;
pub mod window;

pub use middleware::{Identity, RateLimitLayer, RateLimitService};
pub use sweeper::Sweeper;
pub use window::{FixedWindowLimiter, RateLimitEntry};

use crate::error::ConfigError;

/// Requests allowed per window unless configured otherwise.
pub const DEFAULT_MAX_REQUESTS: u32 = 10;
/// Window length unless configured otherwise.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
/// Sweep period unless configured otherwise.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// The decision returned by a rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request is allowed to proceed.
    Allowed {
        /// Requests left in the current window after this one.
        remaining: u32,
    },
    /// The request is denied.
    Denied {
        /// Whole seconds until the window closes. Used for `Retry-After` headers.
        retry_after_secs: u64,
    },
}

impl Decision {
    /// Helper to check if allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Retry delay carried by a denial.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Decision::Denied { retry_after_secs } => Some(*retry_after_secs),
            Decision::Allowed { .. } => None,
        }
    }
}

/// Core interface for rate limiting logic.
///
/// Implementations never fail: a limiter only hands out decisions.
pub trait RateLimiter: Send + Sync {
    /// Record a request for `identity` and decide whether it may proceed.
    fn check(&self, identity: &str) -> Decision;
}

impl<L: RateLimiter + ?Sized> RateLimiter for std::sync::Arc<L> {
    fn check(&self, identity: &str) -> Decision {
        (**self).check(identity)
    }
}

/// Validated limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    max_requests: u32,
    window: Duration,
    sweep_interval: Duration,
}

impl RateLimitConfig {
    /// Create a config with validation. All three values must be non-zero.
    pub fn new(
        max_requests: u32,
        window: Duration,
        sweep_interval: Duration,
    ) -> Result<Self, ConfigError> {
        if max_requests == 0 {
            return Err(ConfigError::InvalidMaxRequests { provided: max_requests });
        }
        if window.is_zero() {
            return Err(ConfigError::InvalidWindow(window));
        }
        if sweep_interval.is_zero() {
            return Err(ConfigError::InvalidSweepInterval(sweep_interval));
        }
        Ok(Self { max_requests, window, sweep_interval })
    }

    /// Requests allowed per window.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Period of the background sweep.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    pub(crate) fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}
