//! Wire types for the control API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// GET /v1/health
#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

/// GET /v1/status
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// "idle" | "active"
    pub state: String,
    pub session_id: Option<Uuid>,
    pub uptime_secs: u64,
}

/// POST /bootstrap, /destroy, /fail/:entity
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OpResponse {
    pub fn done() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}
