//! Pending actions complete immediately with the canned success payload.

mod common;

use fleet_model::{ActionStatus, EntityId};

use common::{eventually, fast_options, spawn_worker};

#[tokio::test]
async fn pending_action_completes_with_canned_payload() {
    let (store, _failures, _handle) = spawn_worker(fast_options());

    store.add_action("3");

    let probe = store.clone();
    eventually("action completed", move || {
        probe.action("3").unwrap().status().unwrap() == ActionStatus::Completed
    })
    .await;

    let results = store.action("3").unwrap().results().unwrap().unwrap();
    assert_eq!(results["output"], "action ran successfully");
}

#[tokio::test]
async fn completed_action_is_left_alone() {
    let (store, _failures, _handle) = spawn_worker(fast_options());

    store.add_action("3");
    let probe = store.clone();
    eventually("action completed", move || {
        probe.action("3").unwrap().status().unwrap() == ActionStatus::Completed
    })
    .await;

    // Redundant deltas do not re-finish the action or alter its results.
    store.touch(EntityId::action("3"));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(
        store.action("3").unwrap().status().unwrap(),
        ActionStatus::Completed
    );
}
