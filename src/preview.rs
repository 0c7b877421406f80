//! AI preview state machine.
//!
//! [`PreviewOrchestrator`] drives one generation attempt per [`generate`] call and publishes
//! its progress as a [`PreviewState`]:
//!
//! ```text
//! Idle ──generate──► Loading ──► Success | Error
//!   ▲                                  │
//!   └───────────────reset──────────────┘
//! ```
//!
//! A new `generate` from a terminal state re-enters `Loading`. Failures never escape
//! `generate`; each one ends up as a [`PreviewError`] in the published state.
//!
//! [`generate`]: PreviewOrchestrator::generate

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

pub mod backend;
pub mod classify;
pub mod http;

pub use backend::{BackendResponse, GuardedBackend, PreviewBackend};
pub use classify::{classify_response, classify_transport};
pub use http::{HttpPreviewClient, PreviewClientConfig};

use crate::error::PreviewError;
use crate::recipe::PreviewPayload;

/// Current disposition of a preview.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    /// Nothing requested yet, or dismissed.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The AI produced a modification.
    Success(Arc<PreviewPayload>),
    /// The attempt failed.
    Error(PreviewError),
}

impl PreviewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// `Success` and `Error` end an attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }

    pub fn payload(&self) -> Option<&PreviewPayload> {
        match self {
            Self::Success(payload) => Some(payload.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PreviewError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Runs preview requests against a [`PreviewBackend`] and publishes their state.
///
/// Every `generate` and `reset` call starts a new epoch. A completion is published only if
/// its epoch is still current, so when calls overlap the latest one wins and a result
/// arriving after `reset` is dropped.
#[derive(Debug)]
pub struct PreviewOrchestrator<B> {
    backend: B,
    state: watch::Sender<PreviewState>,
    epoch: AtomicU64,
}

impl<B: PreviewBackend> PreviewOrchestrator<B> {
    pub fn new(backend: B) -> Self {
        let (state, _) = watch::channel(PreviewState::Idle);
        Self { backend, state, epoch: AtomicU64::new(0) }
    }

    /// Snapshot of the latest published state.
    pub fn state(&self) -> PreviewState {
        self.state.borrow().clone()
    }

    /// Receiver that always holds the latest published state.
    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.state.subscribe()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Request a preview for `recipe_id`.
    ///
    /// A blank id fails immediately without touching the backend. Otherwise `Loading` is
    /// published, the backend is called, and the classified outcome is published.
    pub async fn generate(&self, recipe_id: &str) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        if recipe_id.trim().is_empty() {
            let error = PreviewError::unknown("Recipe ID is required");
            self.publish(epoch, PreviewState::Error(error));
            return;
        }

        self.publish(epoch, PreviewState::Loading);

        let outcome = match self.backend.request_preview(recipe_id).await {
            Ok(response) => classify_response(&response),
            Err(err) => Err(classify_transport(&err)),
        };

        let next = match outcome {
            Ok(payload) => {
                tracing::info!(recipe_id, "AI preview ready");
                PreviewState::Success(Arc::new(payload))
            }
            Err(err) => {
                tracing::warn!(recipe_id, kind = err.kind(), error = %err, "AI preview failed");
                PreviewState::Error(err)
            }
        };

        if !self.publish(epoch, next) {
            tracing::debug!(recipe_id, epoch, "Dropping superseded preview result");
        }
    }

    /// Return to `Idle` from any state. Results of in-flight calls are discarded.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *state = PreviewState::Idle;
        });
    }

    // The epoch is compared under the channel's write lock so a concurrent `reset` cannot slip
    // between the check and the store.
    fn publish(&self, epoch: u64, next: PreviewState) -> bool {
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            *state = next;
            true
        })
    }
}
