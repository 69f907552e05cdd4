//! Shared runtime state for the daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum; the dispatcher keeps
//! the session status snapshot up to date through the shared `RwLock`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dispatcher::ControlHandle;

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Point-in-time snapshot of the session lifecycle, returned by
/// GET /v1/status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionStatus {
    /// "idle" | "active"
    pub state: String,
    pub session_id: Option<Uuid>,
}

impl SessionStatus {
    pub fn idle() -> Self {
        Self {
            state: "idle".to_string(),
            session_id: None,
        }
    }

    pub fn active(session_id: Uuid) -> Self {
        Self {
            state: "active".to_string(),
            session_id: Some(session_id),
        }
    }
}

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Front door to the command dispatcher.
    pub control: ControlHandle,
    /// Static build metadata.
    pub build: BuildInfo,
    /// Session status, written by the dispatcher.
    pub status: Arc<RwLock<SessionStatus>>,
}

impl AppState {
    pub fn new(control: ControlHandle, status: Arc<RwLock<SessionStatus>>) -> Self {
        Self {
            control,
            build: BuildInfo {
                service: "fakefleetd",
                version: env!("CARGO_PKG_VERSION"),
            },
            status,
        }
    }
}

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}
