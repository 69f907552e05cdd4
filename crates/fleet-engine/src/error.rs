use fleet_model::EntityId;
use fleet_store::{StoreError, WatchError};

/// A single entity handler failed while applying a transition policy.
/// Isolated by the worker: the entity is skipped, the loop continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub entity: EntityId,
    pub source: StoreError,
}

impl TransitionError {
    pub fn new(entity: EntityId, source: StoreError) -> Self {
        Self { entity, source }
    }
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transition of {} failed: {}", self.entity, self.source)
    }
}

impl std::error::Error for TransitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Terminal worker outcomes, as observed through [`crate::WorkerHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The change feed failed for a reason other than an explicit stop.
    Feed(WatchError),
    /// The subscription was closed before the control machine was observed
    /// started, so readiness can never be signalled.
    StoppedBeforeReady,
}

impl std::fmt::Display for WorkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feed(err) => write!(f, "change feed failed: {err}"),
            Self::StoppedBeforeReady => {
                write!(f, "worker stopped before the controller became ready")
            }
        }
    }
}

impl std::error::Error for WorkerError {}
