//! Live-updatable configuration handles.
//!
//! The rate limiter reads its limits through a [`DynamicConfig`] on every check, so an
//! operator can tighten or relax the AI preview quota without restarting the process.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// `DynamicConfig<T>` gives lock-free reads and whole-value updates for shared config.
#[derive(Debug)]
pub struct DynamicConfig<T> {
    inner: Arc<ArcSwap<T>>,
}

impl<T> Clone for DynamicConfig<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> DynamicConfig<T> {
    /// Create a new handle holding `value`.
    pub fn new(value: T) -> Self {
        Self { inner: Arc::new(ArcSwap::from_pointee(value)) }
    }

    /// Snapshot the current value.
    pub fn get(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Replace the value entirely. Every clone of the handle observes the new value.
    pub fn set(&self, value: T) {
        self.inner.store(Arc::new(value));
    }

    /// Derive a new value from the current one.
    ///
    /// `f` may run more than once if another update lands concurrently; no update is lost.
    pub fn update<F>(&self, f: F)
    where
        F: Fn(&T) -> T,
    {
        self.inner.rcu(|current| f(current));
    }
}
