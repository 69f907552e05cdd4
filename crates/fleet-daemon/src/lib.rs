//! fleet-daemon
//!
//! The fakefleet daemon: a serialized command dispatcher
//! (bootstrap / destroy / stop) owning one reconciliation session at a
//! time, plus the HTTP control API that drives it.

pub mod api_types;
pub mod commands;
pub mod dispatcher;
pub mod routes;
pub mod state;
