use std::collections::BTreeSet;

/// Per-session reconciliation state: one bootstrap-to-destroy run.
///
/// Instance ids are strictly increasing within a session. The started set
/// guards the dependent-unit cascade so redundant machine deltas never
/// re-trigger unit startup.
#[derive(Debug, Default)]
pub struct Session {
    instance_count: u64,
    machines_started: BTreeSet<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next instance id, `"id-1"`, `"id-2"`, ...
    pub fn next_instance_id(&mut self) -> String {
        self.instance_count += 1;
        format!("id-{}", self.instance_count)
    }

    /// Record the first observation of a machine's started transition.
    /// Returns `true` only the first time a given id is marked.
    pub fn mark_started(&mut self, machine_id: &str) -> bool {
        self.machines_started.insert(machine_id.to_string())
    }
}
