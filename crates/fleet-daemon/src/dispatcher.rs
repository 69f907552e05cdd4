//! Single-consumer command dispatcher.
//!
//! Commands are read off a bounded depth-1 queue, so producers await
//! capacity while a command is in flight; that back-pressure is the
//! serialization mechanism, not an error condition. Every command is
//! completed through its one-shot channel; handler errors never abort the
//! loop (only a terminal Stop does).

use std::sync::Arc;

use fleet_engine::{EngineOptions, FailureRegistry, ReconcileWorker, WorkerHandle};
use fleet_store::Store;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::commands::{Command, CommandCode, DispatchError};
use crate::state::SessionStatus;

/// One bootstrap-to-destroy run, as the dispatcher tracks it.
struct ActiveSession {
    id: Uuid,
    store: Store,
    worker: WorkerHandle,
}

/// Cloneable front door to the dispatcher, used by the control API and the
/// signal listener.
#[derive(Clone)]
pub struct ControlHandle {
    commands: mpsc::Sender<Command>,
    failures: Arc<FailureRegistry>,
}

impl ControlHandle {
    /// Bootstrap a new session; blocks until the controller is ready.
    pub async fn bootstrap(&self) -> Result<(), DispatchError> {
        self.submit(CommandCode::Bootstrap).await
    }

    /// Destroy the active session; blocks until the worker terminated.
    pub async fn destroy(&self) -> Result<(), DispatchError> {
        self.submit(CommandCode::Destroy).await
    }

    /// Stop the dispatcher loop itself.
    pub async fn stop(&self) -> Result<(), DispatchError> {
        self.submit(CommandCode::Stop).await
    }

    /// Mark an entity as doomed to fail. Direct registry mutation: this
    /// needs no session-wide serialization, so it bypasses the queue.
    pub fn fail(&self, entity_key: &str) {
        self.failures.set_failure(entity_key);
    }

    pub fn failures(&self) -> &Arc<FailureRegistry> {
        &self.failures
    }

    async fn submit(&self, code: CommandCode) -> Result<(), DispatchError> {
        let (command, done) = Command::new(code);
        self.commands
            .send(command)
            .await
            .map_err(|_| DispatchError::Stopped)?;
        done.await.unwrap_or(Err(DispatchError::Stopped))
    }
}

/// Single consumer of the command queue; owns the worker's lifecycle.
pub struct Dispatcher {
    commands: mpsc::Receiver<Command>,
    options: EngineOptions,
    failures: Arc<FailureRegistry>,
    status: Arc<RwLock<SessionStatus>>,
    active: Option<ActiveSession>,
}

impl Dispatcher {
    /// Spawn the dispatcher loop. Returns the control handle, the shared
    /// status snapshot, and the loop's join handle (resolves after Stop).
    pub fn spawn(
        options: EngineOptions,
    ) -> (ControlHandle, Arc<RwLock<SessionStatus>>, JoinHandle<()>) {
        // Depth 1: at most one queued command, producers block behind it.
        let (tx, rx) = mpsc::channel(1);
        let failures = Arc::new(FailureRegistry::new());
        let status = Arc::new(RwLock::new(SessionStatus::idle()));

        let dispatcher = Self {
            commands: rx,
            options,
            failures: Arc::clone(&failures),
            status: Arc::clone(&status),
            active: None,
        };
        let task = tokio::spawn(dispatcher.run());

        (
            ControlHandle {
                commands: tx,
                failures,
            },
            status,
            task,
        )
    }

    async fn run(mut self) {
        info!("command dispatcher started");
        while let Some(command) = self.commands.recv().await {
            let code = command.code;
            let result = match code {
                CommandCode::Bootstrap => self.bootstrap().await,
                CommandCode::Destroy => self.destroy().await,
                CommandCode::Stop => {
                    info!("terminating dispatcher");
                    // Best-effort teardown of whatever is still running.
                    if self.active.is_some() {
                        if let Err(err) = self.destroy().await {
                            error!(%err, "session teardown during stop failed");
                        }
                    }
                    Ok(())
                }
            };
            if let Err(err) = &result {
                error!(%err, command = ?code, "command failed");
            }
            let _ = command.done.send(result);
            if code == CommandCode::Stop {
                break;
            }
        }
        info!("command dispatcher terminated");
    }

    async fn bootstrap(&mut self) -> Result<(), DispatchError> {
        if self.active.is_some() {
            return Err(DispatchError::AlreadyBootstrapped);
        }
        info!("bootstrapping session");

        // Session setup: fresh store, subscription first so the worker
        // observes the control machine's creation, then the control entity
        // itself, pending.
        let store = Store::new();
        let watcher = store.watch();
        let mut worker = ReconcileWorker::spawn(
            store.clone(),
            watcher,
            Arc::clone(&self.failures),
            self.options.clone(),
        );
        let control_machine = store.add_machine(&self.options.series);
        info!(machine = %control_machine, "created control machine");

        if let Err(err) = worker.ready().await {
            // Best-effort destroy before surfacing the compound error.
            worker.stop();
            let _ = worker.wait().await;
            self.failures.clear();
            return Err(DispatchError::BootstrapFailed {
                phase: "waiting for readiness",
                message: err.to_string(),
            });
        }

        let session = ActiveSession {
            id: Uuid::new_v4(),
            store,
            worker,
        };
        info!(session = %session.id, "session is ready");
        *self.status.write().await = SessionStatus::active(session.id);
        self.active = Some(session);
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), DispatchError> {
        let Some(mut session) = self.active.take() else {
            return Err(DispatchError::NotBootstrapped);
        };
        info!(session = %session.id, "destroying session");

        // Closing the subscription is the only cancellation path; an
        // in-flight handler wait resolves on its own bound first.
        session.worker.stop();
        let result = session.worker.wait().await;

        drop(session.store);
        self.failures.clear();
        *self.status.write().await = SessionStatus::idle();
        info!("session destroyed");

        result.map_err(DispatchError::Worker)
    }
}

/// Translate OS termination signals into a Stop command, so shutdown goes
/// through the same serialized path as every other lifecycle change.
pub fn spawn_signal_listener(control: ControlHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        terminated().await;
        info!("received termination signal");
        if let Err(err) = control.stop().await {
            error!(%err, "stop command failed");
        }
    })
}

#[cfg(unix)]
async fn terminated() {
    use tokio::signal::unix::{signal, SignalKind};
    let Ok(mut term) = signal(SignalKind::terminate()) else {
        let _ = tokio::signal::ctrl_c().await;
        return;
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn terminated() {
    let _ = tokio::signal::ctrl_c().await;
}
