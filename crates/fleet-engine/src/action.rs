//! Handle changes to action entities.

use fleet_model::{ActionStatus, EntityId};
use tracing::{debug, info};

use crate::worker::ReconcileWorker;
use crate::TransitionError;

impl ReconcileWorker {
    /// Actions model an always-succeeding, instantaneous task executor:
    /// anything pending completes immediately with a canned payload.
    pub(crate) fn action_changed(&mut self, id: &str) -> Result<(), TransitionError> {
        debug!(action = id, "handling changed action");
        let wrap = |source| TransitionError::new(EntityId::action(id), source);

        let action = self.store.action(id).map_err(wrap)?;
        if action.status().map_err(wrap)? == ActionStatus::Pending {
            info!(action = id, "completing action");
            action
                .finish(serde_json::json!({"output": "action ran successfully"}))
                .map_err(wrap)?;
        }
        Ok(())
    }
}
