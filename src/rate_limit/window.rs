//! In-memory fixed-window limiter keyed by identity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adaptive::DynamicConfig;
use crate::clock::{Clock, MonotonicClock};
use crate::rate_limit::sweeper::Sweeper;
use crate::rate_limit::{Decision, RateLimitConfig, RateLimiter};

/// Per-identity counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Requests accepted in the current window.
    pub count: u32,
    /// Clock timestamp (millis) at which the window closes.
    pub window_reset_at: u64,
}

impl RateLimitEntry {
    /// A window is still active at its exact reset instant and expires strictly after it.
    pub fn is_expired(&self, now_millis: u64) -> bool {
        now_millis > self.window_reset_at
    }
}

/// State shared between the limiter and its sweeper task.
#[derive(Debug)]
pub(crate) struct WindowStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    clock: Arc<dyn Clock>,
}

impl WindowStore {
    fn new(clock: Arc<dyn Clock>) -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock }
    }

    // Critical sections never panic halfway through an update, so a poisoned map is still
    // consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delete every expired entry, returning how many were removed.
    pub(crate) fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

/// Allows `max_requests` per `window` for each identity.
///
/// A window opens on the first request after the previous one expired, so this is a
/// fixed window anchored per identity rather than a rolling log. Expired entries are treated
/// as absent the moment they are observed; [`FixedWindowLimiter::start_sweeper`] only
/// reclaims memory.
///
/// # Example
/// ```
/// use healthymeal::rate_limit::{FixedWindowLimiter, RateLimitConfig, RateLimiter};
/// use std::time::Duration;
///
/// let config =
///     RateLimitConfig::new(2, Duration::from_secs(60), Duration::from_secs(300)).unwrap();
/// let limiter = FixedWindowLimiter::new(config);
/// assert!(limiter.check("u1").is_allowed());
/// assert!(limiter.check("u1").is_allowed());
/// assert!(!limiter.check("u1").is_allowed());
/// assert!(limiter.check("u2").is_allowed());
/// ```
#[derive(Debug)]
pub struct FixedWindowLimiter {
    store: Arc<WindowStore>,
    config: DynamicConfig<RateLimitConfig>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl FixedWindowLimiter {
    /// Create a limiter using the monotonic clock. No sweeper runs until
    /// [`start_sweeper`](Self::start_sweeper) is called.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            store: Arc::new(WindowStore::new(Arc::new(MonotonicClock::default()))),
            config: DynamicConfig::new(config),
            sweeper: Mutex::new(None),
        }
    }

    /// Override the clock (useful for deterministic tests). Existing entries are dropped.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.stop_sweeper();
        self.store = Arc::new(WindowStore::new(Arc::new(clock)));
        self
    }

    /// Live configuration handle. New limits apply to the next `check`; open windows keep
    /// their reset time.
    pub fn config(&self) -> &DynamicConfig<RateLimitConfig> {
        &self.config
    }

    /// Spawn the periodic sweep on the current tokio runtime.
    ///
    /// Returns `false` if a sweeper is already running or no runtime is available.
    pub fn start_sweeper(&self) -> bool {
        let mut slot = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|s| !s.is_finished()) {
            return false;
        }
        let period = self.config.get().sweep_interval();
        let Some(sweeper) = Sweeper::spawn(Arc::downgrade(&self.store), period) else {
            tracing::warn!("No tokio runtime, rate limit sweeper not started");
            return false;
        };
        *slot = Some(sweeper);
        true
    }

    /// Whether a sweeper task is currently running.
    pub fn sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|s| !s.is_finished())
    }

    fn stop_sweeper(&self) {
        if let Some(sweeper) = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner).take()
        {
            sweeper.stop();
        }
    }

    /// Stop the sweeper and drop all state, for graceful shutdown or test isolation.
    pub fn shutdown(&self) {
        self.stop_sweeper();
        self.clear_all();
        tracing::info!("Rate limiter shut down");
    }

    /// Discard the entry for `identity`.
    pub fn reset(&self, identity: &str) {
        self.store.lock().remove(identity);
    }

    /// Discard every entry.
    pub fn clear_all(&self) {
        self.store.lock().clear();
    }

    /// Read-only peek. Expired entries read as `None` but are left in place.
    pub fn status(&self, identity: &str) -> Option<RateLimitEntry> {
        let now = self.store.clock.now_millis();
        self.store.lock().get(identity).copied().filter(|entry| !entry.is_expired(now))
    }

    /// Run one sweep pass immediately.
    pub fn sweep(&self) -> usize {
        self.store.sweep_expired()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, identity: &str) -> Decision {
        let config = self.config.get();
        let max = config.max_requests();
        let now = self.store.clock.now_millis();
        let window_reset_at = now.saturating_add(config.window_millis());
        let fresh = RateLimitEntry { count: 0, window_reset_at };

        let mut entries = self.store.lock();
        let entry = entries.entry(identity.to_owned()).or_insert(fresh);
        if entry.is_expired(now) {
            *entry = fresh;
        }

        if entry.count < max {
            entry.count += 1;
            let remaining = max - entry.count;
            tracing::debug!(identity, count = entry.count, remaining, "Rate limit: allowed");
            return Decision::Allowed { remaining };
        }

        let retry_after_secs = entry.window_reset_at.saturating_sub(now).div_ceil(1000).max(1);
        tracing::warn!(identity, count = entry.count, retry_after_secs, "Rate limit: denied");
        Decision::Denied { retry_after_secs }
    }
}
