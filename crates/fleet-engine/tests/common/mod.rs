//! Shared scaffolding for engine scenario tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fleet_engine::{EngineOptions, FailureRegistry, ReconcileWorker, WorkerHandle};
use fleet_store::Store;

/// Engine options tuned for fast tests: real semantics, tiny delays.
pub fn fast_options() -> EngineOptions {
    EngineOptions {
        startup_delay: Duration::from_millis(1),
        presence_timeout: Duration::from_millis(500),
        ..EngineOptions::default()
    }
}

/// Fresh store + failure registry + spawned worker.
pub fn spawn_worker(options: EngineOptions) -> (Store, Arc<FailureRegistry>, WorkerHandle) {
    let store = Store::new();
    let failures = Arc::new(FailureRegistry::new());
    let watcher = store.watch();
    let handle = ReconcileWorker::spawn(store.clone(), watcher, Arc::clone(&failures), options);
    (store, failures, handle)
}

/// Poll until `cond` holds, panicking after a couple of seconds. Used to
/// wait for the worker to quiesce on a final entity state.
pub async fn eventually(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}
