//! fleet-engine
//!
//! Reconciliation engine for the fakefleet control plane.
//!
//! The engine consumes the backing store's delta stream and drives each
//! entity through its deterministic lifecycle: machines are provisioned and
//! started, units are started (or failed, when fault injection is armed),
//! actions complete immediately. The logic in `worker.rs` is only about the
//! top-level watch loop; per-kind transitions live in the files named after
//! the entities (`machine.rs`, `unit.rs`, `action.rs`).
//!
//! Error policy: a failing transition handler is isolated — logged and
//! skipped — and the loop keeps consuming deltas. Only change-feed-layer
//! errors terminate the worker.

mod action;
mod error;
mod failures;
mod machine;
mod options;
mod session;
mod unit;
mod worker;

pub use error::{TransitionError, WorkerError};
pub use failures::FailureRegistry;
pub use options::EngineOptions;
pub use session::Session;
pub use worker::{ReconcileWorker, WorkerHandle, CONTROL_MACHINE_ID};
