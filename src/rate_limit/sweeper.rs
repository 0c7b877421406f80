//! Background reclamation of expired rate limit windows.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::rate_limit::window::WindowStore;

/// Handle to the periodic sweep task.
///
/// The task holds only a weak reference to the store, so it exits on its own once the
/// limiter is dropped. Dropping the handle aborts the task.
#[derive(Debug)]
pub struct Sweeper {
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn on the current runtime. `None` outside a runtime.
    pub(crate) fn spawn(store: Weak<WindowStore>, period: Duration) -> Option<Self> {
        let runtime = Handle::try_current().ok()?;
        let handle = runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let removed = store.sweep_expired();
                if removed > 0 {
                    tracing::info!(removed, "Rate limit sweep reclaimed expired windows");
                } else {
                    tracing::trace!("Rate limit sweep: nothing expired");
                }
            }
        });
        tracing::debug!(period_ms = period.as_millis() as u64, "Rate limit sweeper started");
        Some(Self { handle })
    }

    /// Abort the task.
    pub fn stop(self) {
        self.handle.abort();
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
