//! fleet-store
//!
//! Deterministic in-memory backing store for the fakefleet control plane.
//!
//! Design decisions (kept intentionally simple/deterministic):
//! - Entities live in `BTreeMap`s, so iteration order is stable.
//! - Machine ids are sequential integers starting at `"0"`; the first
//!   machine created in a session is the control entity.
//! - Every entity creation or mutation emits exactly one single-delta batch
//!   to every live watcher, in mutation order. No coalescing, no reordering.
//! - Agent presence is a per-entity flag behind a `tokio::sync::watch`
//!   channel; `wait_agent_presence` is the only async wait in the store.
//!
//! The store is the sole owner of entity storage. Consumers resolve typed
//! handles ([`MachineRef`], [`UnitRef`], [`ActionRef`]) on demand and go
//! through those for every read and write.

mod error;
mod feed;
mod refs;
mod store;

pub use error::StoreError;
pub use feed::{DeltaWatcher, WatchError, WatchHandle};
pub use refs::{ActionRef, MachineRef, UnitRef};
pub use store::Store;
