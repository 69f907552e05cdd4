//! Track which entities should fail.

use std::collections::BTreeSet;
use std::sync::Mutex;

use fleet_model::EntityKind;

/// Registry of entity keys pre-marked to fail.
///
/// Written by the control API (`fail` operation), read by the unit policy,
/// wiped at session teardown so injections never leak into the next session.
/// Keys are normalized as `"<kind>-<id>"` with path separators replaced by
/// dashes.
#[derive(Debug, Default)]
pub struct FailureRegistry {
    entries: Mutex<BTreeSet<String>>,
}

impl FailureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// The given entity will fail as soon as possible. Idempotent.
    pub fn set_failure(&self, key: &str) {
        self.lock().insert(key.to_string());
    }

    /// Whether the given entity should fail.
    pub fn should_fail(&self, kind: EntityKind, id: &str) -> bool {
        let id = id.replace('/', "-");
        self.lock().contains(&format!("{kind}-{id}"))
    }

    /// Clear all scheduled failures.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
