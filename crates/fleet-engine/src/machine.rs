//! Handle changes to machine entities.

use fleet_model::{EntityId, InstanceStatus, MachineStatus};
use fleet_store::MachineRef;
use tracing::{debug, info};

use crate::worker::{ReconcileWorker, CONTROL_MACHINE_ID};
use crate::TransitionError;

/// Nonce recorded with provisioning metadata; the fake cloud has no real
/// provisioning handshake to derive one from.
const PROVISIONING_NONCE: &str = "fake-nonce";

/// Fixed loopback address every fake machine gets.
const PROVIDER_ADDRESS: &str = "127.0.0.1";

impl ReconcileWorker {
    pub(crate) async fn machine_changed(&mut self, id: &str) -> Result<(), TransitionError> {
        debug!(machine = id, "handling changed machine");
        let wrap = |source| TransitionError::new(EntityId::machine(id), source);

        let machine = self.store.machine(id).map_err(wrap)?;

        // Simulate creation by the fake cloud: a machine without an
        // instance id gets provisioned first. The resulting delta re-runs
        // this handler with provisioning in place.
        if machine.instance_id().map_err(wrap)?.is_none() {
            let instance_id = self.session.next_instance_id();
            info!(machine = id, instance = %instance_id, "provisioning machine");
            machine
                .set_provisioned(&instance_id, PROVISIONING_NONCE)
                .map_err(wrap)?;
            machine
                .set_provider_addresses(PROVIDER_ADDRESS)
                .map_err(wrap)?;
        }

        match machine.status().map_err(wrap)?.status {
            MachineStatus::Pending => self.start_machine(&machine).await.map_err(wrap)?,
            MachineStatus::Started => {
                if machine.id() == CONTROL_MACHINE_ID {
                    self.signal_ready();
                }
                // Dependent-entity cascade, exactly once per machine id.
                if self.session.mark_started(machine.id()) {
                    self.start_assigned_units(&machine).await?;
                }
            }
            MachineStatus::Error => {}
        }

        Ok(())
    }

    /// Transition a machine from pending to started.
    async fn start_machine(&mut self, machine: &MachineRef) -> Result<(), fleet_store::StoreError> {
        info!(machine = machine.id(), "starting machine");

        // Fixed short delay simulating instance spin-up.
        tokio::time::sleep(self.options.startup_delay).await;

        machine.set_status(MachineStatus::Started, "")?;
        machine.set_instance_status(InstanceStatus::Running, "")?;
        machine.set_agent_version(&self.options.agent_version())?;

        machine.set_agent_presence()?;
        machine
            .wait_agent_presence(self.options.presence_timeout)
            .await?;

        Ok(())
    }

    /// Start any units already assigned to a freshly started machine.
    async fn start_assigned_units(&mut self, machine: &MachineRef) -> Result<(), TransitionError> {
        let unit_ids = machine
            .units()
            .map_err(|source| TransitionError::new(EntityId::machine(machine.id()), source))?;
        for unit_id in unit_ids {
            debug!(machine = machine.id(), unit = %unit_id, "cascading unit startup");
            self.unit_changed(&unit_id).await?;
        }
        Ok(())
    }
}
