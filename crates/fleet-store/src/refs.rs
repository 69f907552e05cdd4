//! Typed capability handles over the store.
//!
//! Each handle is resolved on demand (`Store::machine` / `unit` / `action`)
//! and re-checks existence on every operation, so holding one across a
//! removal is safe and surfaces as [`StoreError::NotFound`].

use std::time::Duration;

use fleet_model::{
    ActionStatus, AgentStatus, Delta, EntityId, InstanceStatus, MachineStatus, StatusRecord,
    WorkloadStatus,
};
use tokio::sync::watch;

use crate::store::{ActionRecord, MachineRecord, Store, UnitRecord};
use crate::StoreError;

/// Await a presence flag with a bounded timeout.
async fn wait_presence(
    mut rx: watch::Receiver<bool>,
    timeout: Duration,
    entity: EntityId,
) -> Result<(), StoreError> {
    let waited = tokio::time::timeout(timeout, rx.wait_for(|alive| *alive)).await;
    match waited {
        Ok(Ok(_)) => Ok(()),
        // Sender gone: the entity was removed out from under us.
        Ok(Err(_)) => Err(StoreError::NotFound { entity }),
        Err(_) => Err(StoreError::PresenceTimeout { entity }),
    }
}

// ---------------------------------------------------------------------------
// MachineRef
// ---------------------------------------------------------------------------

pub struct MachineRef {
    store: Store,
    id: String,
}

impl std::fmt::Debug for MachineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineRef").field("id", &self.id).finish()
    }
}

impl MachineRef {
    pub(crate) fn new(store: Store, id: &str) -> Self {
        Self {
            store,
            id: id.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn entity(&self) -> EntityId {
        EntityId::machine(&self.id)
    }

    fn read<T>(&self, f: impl FnOnce(&MachineRecord) -> T) -> Result<T, StoreError> {
        let inner = self.store.lock();
        let rec = inner
            .machines
            .get(&self.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: self.entity(),
            })?;
        Ok(f(rec))
    }

    /// Apply a mutation and notify watchers of the change.
    fn write<T>(&self, f: impl FnOnce(&mut MachineRecord) -> T) -> Result<T, StoreError> {
        let mut inner = self.store.lock();
        let rec = inner
            .machines
            .get_mut(&self.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: self.entity(),
            })?;
        let out = f(rec);
        inner.emit(Delta::changed(self.entity()));
        Ok(out)
    }

    pub fn series(&self) -> Result<String, StoreError> {
        self.read(|m| m.series.clone())
    }

    pub fn status(&self) -> Result<StatusRecord<MachineStatus>, StoreError> {
        self.read(|m| m.status.clone())
    }

    pub fn set_status(&self, status: MachineStatus, message: &str) -> Result<(), StoreError> {
        self.write(|m| m.status = StatusRecord::new(status, message))
    }

    pub fn instance_id(&self) -> Result<Option<String>, StoreError> {
        self.read(|m| m.instance_id.clone())
    }

    pub fn nonce(&self) -> Result<Option<String>, StoreError> {
        self.read(|m| m.nonce.clone())
    }

    pub fn set_provisioned(&self, instance_id: &str, nonce: &str) -> Result<(), StoreError> {
        self.write(|m| {
            m.instance_id = Some(instance_id.to_string());
            m.nonce = Some(nonce.to_string());
        })
    }

    pub fn instance_status(&self) -> Result<StatusRecord<InstanceStatus>, StoreError> {
        self.read(|m| m.instance_status.clone())
    }

    pub fn set_instance_status(
        &self,
        status: InstanceStatus,
        message: &str,
    ) -> Result<(), StoreError> {
        self.write(|m| m.instance_status = StatusRecord::new(status, message))
    }

    pub fn provider_addresses(&self) -> Result<Vec<String>, StoreError> {
        self.read(|m| m.provider_addresses.clone())
    }

    pub fn set_provider_addresses(&self, addr: &str) -> Result<(), StoreError> {
        self.write(|m| m.provider_addresses = vec![addr.to_string()])
    }

    pub fn agent_version(&self) -> Result<Option<String>, StoreError> {
        self.read(|m| m.agent_version.clone())
    }

    pub fn set_agent_version(&self, version: &str) -> Result<(), StoreError> {
        self.write(|m| m.agent_version = Some(version.to_string()))
    }

    /// Mark the machine agent alive. Presence is not part of the entity
    /// document, so no delta is emitted.
    pub fn set_agent_presence(&self) -> Result<(), StoreError> {
        self.read(|m| {
            let _ = m.presence.send(true);
        })
    }

    pub fn agent_presence(&self) -> Result<bool, StoreError> {
        self.read(|m| *m.presence.borrow())
    }

    pub async fn wait_agent_presence(&self, timeout: Duration) -> Result<(), StoreError> {
        let rx = self.read(|m| m.presence.subscribe())?;
        wait_presence(rx, timeout, self.entity()).await
    }

    /// Ids of units assigned to this machine, in stable order.
    pub fn units(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.store.lock();
        if !inner.machines.contains_key(&self.id) {
            return Err(StoreError::NotFound {
                entity: self.entity(),
            });
        }
        Ok(inner
            .units
            .iter()
            .filter(|(_, u)| u.machine_id.as_deref() == Some(self.id.as_str()))
            .map(|(id, _)| id.clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// UnitRef
// ---------------------------------------------------------------------------

pub struct UnitRef {
    store: Store,
    id: String,
}

impl std::fmt::Debug for UnitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitRef").field("id", &self.id).finish()
    }
}

impl UnitRef {
    pub(crate) fn new(store: Store, id: &str) -> Self {
        Self {
            store,
            id: id.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn entity(&self) -> EntityId {
        EntityId::unit(&self.id)
    }

    fn read<T>(&self, f: impl FnOnce(&UnitRecord) -> T) -> Result<T, StoreError> {
        let inner = self.store.lock();
        let rec = inner
            .units
            .get(&self.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: self.entity(),
            })?;
        Ok(f(rec))
    }

    fn write<T>(&self, f: impl FnOnce(&mut UnitRecord) -> T) -> Result<T, StoreError> {
        let mut inner = self.store.lock();
        let rec = inner
            .units
            .get_mut(&self.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: self.entity(),
            })?;
        let out = f(rec);
        inner.emit(Delta::changed(self.entity()));
        Ok(out)
    }

    pub fn agent_status(&self) -> Result<StatusRecord<AgentStatus>, StoreError> {
        self.read(|u| u.agent_status.clone())
    }

    pub fn set_agent_status(&self, status: AgentStatus, message: &str) -> Result<(), StoreError> {
        self.write(|u| u.agent_status = StatusRecord::new(status, message))
    }

    /// Workload status; the "status" of a unit from the operator's view.
    pub fn status(&self) -> Result<StatusRecord<WorkloadStatus>, StoreError> {
        self.read(|u| u.workload_status.clone())
    }

    pub fn set_status(&self, status: WorkloadStatus, message: &str) -> Result<(), StoreError> {
        self.write(|u| u.workload_status = StatusRecord::new(status, message))
    }

    pub fn assigned_machine_id(&self) -> Result<Option<String>, StoreError> {
        self.read(|u| u.machine_id.clone())
    }

    pub fn assign_to_machine(&self, machine_id: &str) -> Result<(), StoreError> {
        let mut inner = self.store.lock();
        if !inner.machines.contains_key(machine_id) {
            return Err(StoreError::UnknownMachine {
                unit: self.id.clone(),
                machine: machine_id.to_string(),
            });
        }
        let rec = inner
            .units
            .get_mut(&self.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: self.entity(),
            })?;
        rec.machine_id = Some(machine_id.to_string());
        inner.emit(Delta::changed(self.entity()));
        Ok(())
    }

    pub fn set_agent_presence(&self) -> Result<(), StoreError> {
        self.read(|u| {
            let _ = u.presence.send(true);
        })
    }

    pub fn agent_presence(&self) -> Result<bool, StoreError> {
        self.read(|u| *u.presence.borrow())
    }

    pub async fn wait_agent_presence(&self, timeout: Duration) -> Result<(), StoreError> {
        let rx = self.read(|u| u.presence.subscribe())?;
        wait_presence(rx, timeout, self.entity()).await
    }
}

// ---------------------------------------------------------------------------
// ActionRef
// ---------------------------------------------------------------------------

pub struct ActionRef {
    store: Store,
    id: String,
}

impl std::fmt::Debug for ActionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRef").field("id", &self.id).finish()
    }
}

impl ActionRef {
    pub(crate) fn new(store: Store, id: &str) -> Self {
        Self {
            store,
            id: id.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn entity(&self) -> EntityId {
        EntityId::action(&self.id)
    }

    fn read<T>(&self, f: impl FnOnce(&ActionRecord) -> T) -> Result<T, StoreError> {
        let inner = self.store.lock();
        let rec = inner
            .actions
            .get(&self.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: self.entity(),
            })?;
        Ok(f(rec))
    }

    pub fn status(&self) -> Result<ActionStatus, StoreError> {
        self.read(|a| a.status)
    }

    pub fn results(&self) -> Result<Option<serde_json::Value>, StoreError> {
        self.read(|a| a.results.clone())
    }

    /// Complete the action with the given results payload.
    pub fn finish(&self, results: serde_json::Value) -> Result<(), StoreError> {
        let mut inner = self.store.lock();
        let rec = inner
            .actions
            .get_mut(&self.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: self.entity(),
            })?;
        rec.status = ActionStatus::Completed;
        rec.results = Some(results);
        inner.emit(Delta::changed(self.entity()));
        Ok(())
    }
}
