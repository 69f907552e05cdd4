//! fleet-model
//!
//! Shared entity model for the fakefleet control plane: entity kinds and
//! ids, change-feed deltas, and the status enums each transition policy
//! reads and writes.
//!
//! Pure types only. No IO, no async, no store access.

mod status;
mod types;

pub use status::*;
pub use types::*;
