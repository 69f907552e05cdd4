//! Handle changes to unit entities.

use fleet_model::{AgentStatus, EntityId, EntityKind, WorkloadStatus};
use fleet_store::UnitRef;
use tracing::{debug, info};

use crate::worker::ReconcileWorker;
use crate::TransitionError;

impl ReconcileWorker {
    pub(crate) async fn unit_changed(&mut self, id: &str) -> Result<(), TransitionError> {
        debug!(unit = id, "handling changed unit");
        let wrap = |source| TransitionError::new(EntityId::unit(id), source);

        let unit = self.store.unit(id).map_err(wrap)?;

        if unit.agent_status().map_err(wrap)?.status == AgentStatus::Allocating {
            return self.start_unit(&unit).await.map_err(wrap);
        }

        // Fault injection: flagged units end in Error and stay there. An
        // Error unit is terminal; the policy never heals it.
        let workload = unit.status().map_err(wrap)?.status;
        if workload != WorkloadStatus::Error && self.failures.should_fail(EntityKind::Unit, id) {
            info!(unit = id, "failing unit per failure registry");
            unit.set_status(WorkloadStatus::Error, "unit errored")
                .map_err(wrap)?;
            unit.set_agent_status(AgentStatus::Error, "unit errored")
                .map_err(wrap)?;
        }

        Ok(())
    }

    /// Transition a unit from allocating to idle/active.
    async fn start_unit(&mut self, unit: &UnitRef) -> Result<(), fleet_store::StoreError> {
        if unit.assigned_machine_id()?.is_none() {
            // No machine yet. Either create one for the unit, or leave it
            // for external assignment. Once assigned, a later delta takes
            // the started path instead.
            if self.options.auto_create_machines {
                return self.add_machine_for_unit(unit);
            }
            debug!(unit = unit.id(), "unit has no machine; waiting for assignment");
            return Ok(());
        }

        info!(unit = unit.id(), "starting unit");
        unit.set_agent_status(AgentStatus::Idle, "")?;
        unit.set_status(WorkloadStatus::Active, "")?;

        unit.set_agent_presence()?;
        unit.wait_agent_presence(self.options.presence_timeout)
            .await?;

        Ok(())
    }

    /// Create a machine for a unit that doesn't have one yet.
    fn add_machine_for_unit(&mut self, unit: &UnitRef) -> Result<(), fleet_store::StoreError> {
        info!(unit = unit.id(), "adding new machine for unit");
        let machine_id = self.store.add_machine(&self.options.series);
        unit.assign_to_machine(&machine_id)
    }
}
