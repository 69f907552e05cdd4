//! Machines created pending converge to started exactly once: one
//! provisioning pass, one readiness signal, no repeated side effects on
//! redundant deltas.

mod common;

use fleet_model::{EntityId, InstanceStatus, MachineStatus};

use common::{eventually, fast_options, spawn_worker};

#[tokio::test]
async fn pending_machine_converges_to_started() {
    let (store, _failures, mut handle) = spawn_worker(fast_options());

    let m0 = store.add_machine("noble");
    handle.ready().await.unwrap();

    let machine = store.machine(&m0).unwrap();
    assert_eq!(machine.status().unwrap().status, MachineStatus::Started);
    assert_eq!(
        machine.instance_status().unwrap().status,
        InstanceStatus::Running
    );
    assert_eq!(machine.instance_id().unwrap(), Some("id-1".to_string()));
    assert_eq!(
        machine.provider_addresses().unwrap(),
        vec!["127.0.0.1".to_string()]
    );
    assert_eq!(
        machine.agent_version().unwrap(),
        Some("2.0.0-noble-amd64".to_string())
    );
    assert!(machine.agent_presence().unwrap());
}

#[tokio::test]
async fn redundant_deltas_do_not_reprovision() {
    let (store, _failures, mut handle) = spawn_worker(fast_options());

    let m0 = store.add_machine("noble");
    handle.ready().await.unwrap();

    // Hammer the same entity with redundant deltas; the instance id must
    // stay at the one assigned during the first provisioning pass.
    for _ in 0..5 {
        store.touch(EntityId::machine(&m0));
    }
    let second = store.add_machine("noble");

    let store2 = store.clone();
    eventually("second machine started", move || {
        store2.machine(&second).unwrap().status().unwrap().status == MachineStatus::Started
    })
    .await;

    let machine = store.machine(&m0).unwrap();
    assert_eq!(machine.instance_id().unwrap(), Some("id-1".to_string()));
    assert_eq!(machine.status().unwrap().status, MachineStatus::Started);
}

#[tokio::test]
async fn readiness_fires_exactly_once_for_the_control_machine() {
    let (store, _failures, mut handle) = spawn_worker(fast_options());

    let m0 = store.add_machine("noble");
    handle.ready().await.unwrap();

    // A second ready() is an immediate no-op, redundant started deltas do
    // not disturb it.
    store.touch(EntityId::machine(&m0));
    handle.ready().await.unwrap();
}

#[tokio::test]
async fn instance_ids_increase_across_machines() {
    let (store, _failures, mut handle) = spawn_worker(fast_options());

    store.add_machine("noble");
    handle.ready().await.unwrap();
    let m1 = store.add_machine("noble");

    let store2 = store.clone();
    let m1_probe = m1.clone();
    eventually("machine 1 provisioned", move || {
        store2
            .machine(&m1_probe)
            .unwrap()
            .instance_id()
            .unwrap()
            .is_some()
    })
    .await;

    assert_eq!(
        store.machine(&m1).unwrap().instance_id().unwrap(),
        Some("id-2".to_string())
    );
}
