use std::time::Duration;

/// Agent version stamped on started machines.
pub const AGENT_VERSION: &str = "2.0.0";

/// Runtime options for the reconciliation engine.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Default OS series for machines created by the engine.
    pub series: String,
    /// Whether to automatically create machines for units that don't
    /// appear to have one.
    pub auto_create_machines: bool,
    /// Fixed simulated delay before a pending machine starts.
    pub startup_delay: Duration,
    /// Bound on agent-presence synchronization waits.
    pub presence_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            series: "noble".to_string(),
            auto_create_machines: true,
            startup_delay: Duration::from_millis(50),
            presence_timeout: Duration::from_secs(2),
        }
    }
}

impl EngineOptions {
    /// Full agent version string for this configuration,
    /// e.g. `"2.0.0-noble-amd64"`.
    pub fn agent_version(&self) -> String {
        format!("{AGENT_VERSION}-{}-amd64", self.series)
    }
}
