use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use fleet_model::{
    ActionStatus, AgentStatus, Delta, EntityId, InstanceStatus, MachineStatus, StatusRecord,
    WorkloadStatus,
};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::feed::DeltaWatcher;
use crate::refs::{ActionRef, MachineRef, UnitRef};
use crate::StoreError;

// ---------------------------------------------------------------------------
// Entity records
// ---------------------------------------------------------------------------

pub(crate) struct MachineRecord {
    pub series: String,
    pub status: StatusRecord<MachineStatus>,
    pub instance_status: StatusRecord<InstanceStatus>,
    pub instance_id: Option<String>,
    pub nonce: Option<String>,
    pub provider_addresses: Vec<String>,
    pub agent_version: Option<String>,
    pub presence: watch::Sender<bool>,
}

impl MachineRecord {
    fn new(series: &str) -> Self {
        let (presence, _) = watch::channel(false);
        Self {
            series: series.to_string(),
            status: StatusRecord::new(MachineStatus::Pending, ""),
            instance_status: StatusRecord::new(InstanceStatus::Provisioning, ""),
            instance_id: None,
            nonce: None,
            provider_addresses: Vec::new(),
            agent_version: None,
            presence,
        }
    }
}

pub(crate) struct UnitRecord {
    pub agent_status: StatusRecord<AgentStatus>,
    pub workload_status: StatusRecord<WorkloadStatus>,
    pub machine_id: Option<String>,
    pub presence: watch::Sender<bool>,
}

impl UnitRecord {
    fn new(machine_id: Option<String>) -> Self {
        let (presence, _) = watch::channel(false);
        Self {
            agent_status: StatusRecord::new(AgentStatus::Allocating, ""),
            workload_status: StatusRecord::new(WorkloadStatus::Waiting, ""),
            machine_id,
            presence,
        }
    }
}

pub(crate) struct ActionRecord {
    pub status: ActionStatus,
    pub results: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub(crate) struct Inner {
    pub machines: BTreeMap<String, MachineRecord>,
    pub units: BTreeMap<String, UnitRecord>,
    pub actions: BTreeMap<String, ActionRecord>,
    next_machine_id: u64,
    watchers: Vec<mpsc::UnboundedSender<Vec<Delta>>>,
}

impl Inner {
    /// Deliver one single-delta batch to every live watcher, pruning
    /// watchers whose receiving side is gone. Called with the store lock
    /// held so batches are delivered in mutation order.
    pub fn emit(&mut self, delta: Delta) {
        debug!(entity = %delta.entity, removed = delta.removed, "emitting delta");
        self.watchers.retain(|tx| tx.send(vec![delta.clone()]).is_ok());
    }
}

/// Cheaply cloneable handle to the in-memory backing store.
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Arc<Mutex<Inner>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                machines: BTreeMap::new(),
                units: BTreeMap::new(),
                actions: BTreeMap::new(),
                next_machine_id: 0,
                watchers: Vec::new(),
            })),
        }
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // The store mutex only guards short in-memory critical sections, so
        // a poisoned lock means a panic mid-mutation; propagating it would
        // just re-panic with less context.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // -- creation ----------------------------------------------------------

    /// Create a machine in `Pending` and return its id. Ids are sequential
    /// integers starting at `"0"`.
    pub fn add_machine(&self, series: &str) -> String {
        let mut inner = self.lock();
        let id = inner.next_machine_id.to_string();
        inner.next_machine_id += 1;
        inner.machines.insert(id.clone(), MachineRecord::new(series));
        inner.emit(Delta::changed(EntityId::machine(id.clone())));
        id
    }

    /// Create a unit in `Allocating`, optionally assigned to a machine.
    pub fn add_unit(&self, id: &str, machine: Option<&str>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(machine_id) = machine {
            if !inner.machines.contains_key(machine_id) {
                return Err(StoreError::UnknownMachine {
                    unit: id.to_string(),
                    machine: machine_id.to_string(),
                });
            }
        }
        inner
            .units
            .insert(id.to_string(), UnitRecord::new(machine.map(String::from)));
        inner.emit(Delta::changed(EntityId::unit(id)));
        Ok(())
    }

    /// Create an action in `Pending`.
    pub fn add_action(&self, id: &str) {
        let mut inner = self.lock();
        inner.actions.insert(
            id.to_string(),
            ActionRecord {
                status: ActionStatus::Pending,
                results: None,
            },
        );
        inner.emit(Delta::changed(EntityId::action(id)));
    }

    /// Re-announce an entity without mutating it. Lets scenarios deliver
    /// redundant deltas, which the real change feed produces freely.
    pub fn touch(&self, entity: EntityId) {
        self.lock().emit(Delta::changed(entity));
    }

    /// Remove a unit, notifying watchers with a removal delta.
    pub fn remove_unit(&self, id: &str) {
        let mut inner = self.lock();
        if inner.units.remove(id).is_some() {
            inner.emit(Delta::removed(EntityId::unit(id)));
        }
    }

    // -- resolution --------------------------------------------------------

    pub fn machine(&self, id: &str) -> Result<MachineRef, StoreError> {
        let inner = self.lock();
        if !inner.machines.contains_key(id) {
            return Err(StoreError::NotFound {
                entity: EntityId::machine(id),
            });
        }
        Ok(MachineRef::new(self.clone(), id))
    }

    pub fn unit(&self, id: &str) -> Result<UnitRef, StoreError> {
        let inner = self.lock();
        if !inner.units.contains_key(id) {
            return Err(StoreError::NotFound {
                entity: EntityId::unit(id),
            });
        }
        Ok(UnitRef::new(self.clone(), id))
    }

    pub fn action(&self, id: &str) -> Result<ActionRef, StoreError> {
        let inner = self.lock();
        if !inner.actions.contains_key(id) {
            return Err(StoreError::NotFound {
                entity: EntityId::action(id),
            });
        }
        Ok(ActionRef::new(self.clone(), id))
    }

    /// Ids of all machines, in stable order.
    pub fn machine_ids(&self) -> Vec<String> {
        self.lock().machines.keys().cloned().collect()
    }

    // -- change feed -------------------------------------------------------

    /// Subscribe a new watcher to the delta stream. Only mutations after
    /// this call are observed.
    pub fn watch(&self) -> DeltaWatcher {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().watchers.push(tx);
        DeltaWatcher::new(rx)
    }
}
