//! Top-level watch loop of the reconciliation worker.

use std::sync::Arc;

use fleet_model::{EntityId, EntityKind};
use fleet_store::{DeltaWatcher, Store, WatchError, WatchHandle};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::{EngineOptions, FailureRegistry, Session, TransitionError, WorkerError};

/// Id of the designated control entity. The worker signals readiness the
/// first time this machine is observed started.
pub const CONTROL_MACHINE_ID: &str = "0";

/// Consumer side of a spawned worker.
pub struct WorkerHandle {
    ready: Option<oneshot::Receiver<Result<(), WorkerError>>>,
    done: Option<oneshot::Receiver<Result<(), WorkerError>>>,
    stop: WatchHandle,
}

impl WorkerHandle {
    /// Wait for the worker to be ready, i.e. for the control machine to be
    /// observed transitioning to started. Resolves with an error if the
    /// worker terminates first.
    pub async fn ready(&mut self) -> Result<(), WorkerError> {
        match self.ready.take() {
            Some(rx) => rx.await.unwrap_or(Err(WorkerError::StoppedBeforeReady)),
            // Readiness is one-shot; it already fired.
            None => Ok(()),
        }
    }

    /// Close the delta subscription. This is the only cancellation path: a
    /// handler already blocked on a bounded presence wait still resolves on
    /// its own before the worker reports termination.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Wait for the worker to terminate, cleanly (stopped sentinel) or with
    /// a feed error.
    pub async fn wait(&mut self) -> Result<(), WorkerError> {
        match self.done.take() {
            Some(rx) => rx
                .await
                .unwrap_or(Err(WorkerError::Feed(WatchError::Disconnected))),
            None => Ok(()),
        }
    }
}

/// The reconciliation worker: single consumer of one session's delta
/// stream.
pub struct ReconcileWorker {
    pub(crate) store: Store,
    pub(crate) failures: Arc<FailureRegistry>,
    pub(crate) options: EngineOptions,
    pub(crate) session: Session,
    ready: Option<oneshot::Sender<Result<(), WorkerError>>>,
}

impl ReconcileWorker {
    /// Spawn the worker over an already-subscribed watcher and return its
    /// handle. One worker per session.
    pub fn spawn(
        store: Store,
        watcher: DeltaWatcher,
        failures: Arc<FailureRegistry>,
        options: EngineOptions,
    ) -> WorkerHandle {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        let stop = watcher.handle();

        let worker = Self {
            store,
            failures,
            options,
            session: Session::new(),
            ready: Some(ready_tx),
        };
        tokio::spawn(worker.run(watcher, done_tx));

        WorkerHandle {
            ready: Some(ready_rx),
            done: Some(done_rx),
            stop,
        }
    }

    async fn run(
        mut self,
        mut watcher: DeltaWatcher,
        done: oneshot::Sender<Result<(), WorkerError>>,
    ) {
        info!("reconciliation worker started");
        let result = loop {
            let batch = match watcher.next().await {
                Ok(batch) => batch,
                Err(WatchError::Stopped) => break Ok(()),
                Err(err) => {
                    error!(%err, "watcher failed");
                    break Err(WorkerError::Feed(err));
                }
            };
            // Strictly in delivery order; no intra-batch parallelism.
            for delta in batch {
                debug!(entity = %delta.entity, removed = delta.removed, "delta");
                if delta.removed {
                    continue;
                }
                if let Err(err) = self.handle_changed(&delta.entity).await {
                    // Isolate the failing entity and keep consuming.
                    error!(%err, "transition failed; skipping entity");
                }
            }
        };
        info!("watch loop terminated");

        if let Some(tx) = self.ready.take() {
            let _ = tx.send(Err(match &result {
                Ok(()) => WorkerError::StoppedBeforeReady,
                Err(err) => err.clone(),
            }));
        }
        let _ = done.send(result);
    }

    async fn handle_changed(&mut self, entity: &EntityId) -> Result<(), TransitionError> {
        match entity.kind {
            EntityKind::Machine => self.machine_changed(&entity.id).await,
            EntityKind::Unit => self.unit_changed(&entity.id).await,
            EntityKind::Action => self.action_changed(&entity.id),
        }
    }

    /// Fire the one-shot readiness signal, if it hasn't fired yet.
    pub(crate) fn signal_ready(&mut self) {
        if let Some(tx) = self.ready.take() {
            info!("controller is ready");
            let _ = tx.send(Ok(()));
        }
    }
}
