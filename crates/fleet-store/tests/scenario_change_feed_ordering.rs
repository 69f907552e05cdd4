//! Change feed contract: batches arrive in mutation order, stopping the
//! watcher yields the distinguished stopped sentinel, and watchers only see
//! mutations made after they subscribed.

use fleet_model::{EntityId, MachineStatus};
use fleet_store::{Store, WatchError};

#[tokio::test]
async fn deltas_arrive_in_mutation_order() {
    let store = Store::new();
    let mut watcher = store.watch();

    let m0 = store.add_machine("noble");
    store.add_unit("wordpress-0", Some(&m0)).unwrap();
    store.add_action("7");

    let first = watcher.next().await.unwrap();
    assert_eq!(first, vec![fleet_model::Delta::changed(EntityId::machine("0"))]);

    let second = watcher.next().await.unwrap();
    assert_eq!(second[0].entity, EntityId::unit("wordpress-0"));
    assert!(!second[0].removed);

    let third = watcher.next().await.unwrap();
    assert_eq!(third[0].entity, EntityId::action("7"));
}

#[tokio::test]
async fn mutations_through_refs_are_observed() {
    let store = Store::new();
    let m0 = store.add_machine("noble");
    let mut watcher = store.watch();

    store
        .machine(&m0)
        .unwrap()
        .set_status(MachineStatus::Started, "")
        .unwrap();

    let batch = watcher.next().await.unwrap();
    assert_eq!(batch[0].entity, EntityId::machine(&m0));
    assert_eq!(
        store.machine(&m0).unwrap().status().unwrap().status,
        MachineStatus::Started
    );
}

#[tokio::test]
async fn stop_yields_stopped_sentinel() {
    let store = Store::new();
    let mut watcher = store.watch();
    let handle = watcher.handle();

    handle.stop();

    let err = watcher.next().await.unwrap_err();
    assert!(err.is_stopped());

    // Stopping is sticky and idempotent.
    handle.stop();
    assert_eq!(watcher.next().await.unwrap_err(), WatchError::Stopped);
}

#[tokio::test]
async fn stop_unblocks_a_pending_next() {
    let store = Store::new();
    let mut watcher = store.watch();
    let handle = watcher.handle();

    let waiter = tokio::spawn(async move { watcher.next().await });
    tokio::task::yield_now().await;
    handle.stop();

    let got = waiter.await.unwrap();
    assert_eq!(got.unwrap_err(), WatchError::Stopped);
}

#[tokio::test]
async fn watcher_subscribed_late_misses_earlier_mutations() {
    let store = Store::new();
    store.add_machine("noble");

    let mut watcher = store.watch();
    store.add_machine("noble");

    let batch = watcher.next().await.unwrap();
    assert_eq!(batch[0].entity, EntityId::machine("1"));
}

#[tokio::test]
async fn removing_a_unit_emits_a_removal_delta() {
    let store = Store::new();
    let m0 = store.add_machine("noble");
    store.add_unit("wordpress-0", Some(&m0)).unwrap();

    let mut watcher = store.watch();
    store.remove_unit("wordpress-0");

    let batch = watcher.next().await.unwrap();
    assert_eq!(batch[0].entity, EntityId::unit("wordpress-0"));
    assert!(batch[0].removed);
}
