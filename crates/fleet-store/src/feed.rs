//! Change feed plumbing: watchers over the store's delta stream.

use std::sync::Arc;

use fleet_model::Delta;
use tokio::sync::{mpsc, watch};

/// Errors returned by [`DeltaWatcher::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    /// The watcher was explicitly stopped via [`WatchHandle::stop`]. This is
    /// the expected termination signal, not a failure.
    Stopped,
    /// The store side of the feed went away without a stop request.
    Disconnected,
}

impl WatchError {
    pub fn is_stopped(&self) -> bool {
        matches!(self, WatchError::Stopped)
    }
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "watcher was stopped"),
            Self::Disconnected => write!(f, "change feed disconnected"),
        }
    }
}

impl std::error::Error for WatchError {}

/// Cloneable handle that closes a watcher's subscription. Stopping is
/// idempotent; every pending and future [`DeltaWatcher::next`] call returns
/// [`WatchError::Stopped`] afterwards.
#[derive(Clone)]
pub struct WatchHandle {
    stop: Arc<watch::Sender<bool>>,
}

impl WatchHandle {
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

/// Single-consumer view of the store's delta stream.
///
/// Batches arrive in mutation order and are never reordered. `next` blocks
/// between batches.
pub struct DeltaWatcher {
    rx: mpsc::UnboundedReceiver<Vec<Delta>>,
    stop_rx: watch::Receiver<bool>,
    handle: WatchHandle,
}

impl DeltaWatcher {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Vec<Delta>>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            rx,
            stop_rx,
            handle: WatchHandle {
                stop: Arc::new(stop_tx),
            },
        }
    }

    /// Handle for stopping this watcher from another task.
    pub fn handle(&self) -> WatchHandle {
        self.handle.clone()
    }

    /// Next batch of deltas. Blocks until a batch arrives, the watcher is
    /// stopped, or the store side disconnects.
    pub async fn next(&mut self) -> Result<Vec<Delta>, WatchError> {
        if *self.stop_rx.borrow() {
            return Err(WatchError::Stopped);
        }
        tokio::select! {
            // Only resolves on a stop request: the watcher itself keeps the
            // stop sender alive through its own handle.
            _ = self.stop_rx.changed() => Err(WatchError::Stopped),
            batch = self.rx.recv() => match batch {
                Some(batch) => Ok(batch),
                None => Err(WatchError::Disconnected),
            },
        }
    }
}
