//! Execution context handling during removal.

use entislee_core::{
    ComponentId, CoreError, ExecutionContext, ExecutionContextSwitcher, ManagerConfig,
};
use entislee_testkit::prelude::*;
use std::error::Error;
use std::sync::Arc;

fn host() -> ExecutionContext {
    ExecutionContext::new(ComponentId::new("Host"))
}

#[test]
fn cleanup_runs_under_each_owning_component() {
    let harness = TestHarness::new();
    let root_hook = RecordingCleanup::new();
    let child_hook = RecordingCleanup::new();
    root_hook.install(harness.registry(), component_a());
    child_hook.install(harness.registry(), component_b());

    let caller = host();
    let _guard = ExecutionContextSwitcher::enter(caller.clone());

    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, "conv1");
    let child = harness.create_child(&mut txn, &root, "slot");
    harness.remove(&mut txn, &root, false).unwrap();

    assert_eq!(
        child_hook.events(),
        vec![CleanupEvent {
            entity_id: child.id().clone(),
            context: Some(component_b()),
        }]
    );
    assert_eq!(
        root_hook.events(),
        vec![CleanupEvent {
            entity_id: root.id().clone(),
            context: Some(component_a()),
        }]
    );
    assert!(ExecutionContext::current().unwrap().same_as(&caller));
}

#[test]
fn children_are_cleaned_before_parent() {
    let harness = TestHarness::new();
    let hook = RecordingCleanup::new();
    hook.install(harness.registry(), component_a());
    hook.install(harness.registry(), component_b());

    let mut txn = harness.begin();
    let tree = scenarios::build_tree(&harness, &mut txn, 2, 1);
    harness.remove(&mut txn, &tree[0], false).unwrap();

    let order = hook.entity_ids();
    let expected: Vec<_> = tree.iter().rev().map(|entity| entity.id().clone()).collect();
    assert_eq!(order, expected);
}

#[test]
fn failed_cleanup_restores_caller_context() {
    let harness = TestHarness::new();
    let hook = RecordingCleanup::refusing();
    hook.install(harness.registry(), component_a());

    let caller = host();
    let _guard = ExecutionContextSwitcher::enter(caller.clone());

    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, "conv1");
    let err = harness.remove(&mut txn, &root, false).unwrap_err();

    assert!(matches!(err, CoreError::RemovalFailure { .. }));
    assert!(err.source().unwrap().to_string().contains("refused"));
    assert_eq!(hook.events()[0].context, Some(component_a()));
    assert!(ExecutionContext::current().unwrap().same_as(&caller));
    assert!(!root.is_removed());
    assert!(Arc::ptr_eq(&harness.get(&mut txn, root.id()).unwrap(), &root));
}

#[test]
fn failed_child_cleanup_stops_cascade() {
    let harness = TestHarness::new();
    let root_hook = RecordingCleanup::new();
    let child_hook = RecordingCleanup::refusing();
    root_hook.install(harness.registry(), component_a());
    child_hook.install(harness.registry(), component_b());

    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, "conv1");
    let child = harness.create_child(&mut txn, &root, "slot");

    let err = harness.remove(&mut txn, &root, false).unwrap_err();

    match err {
        CoreError::RemovalFailure { entity_id, .. } => assert_eq!(&entity_id, child.id()),
        other => panic!("expected RemovalFailure, got {other:?}"),
    }
    assert!(root_hook.events().is_empty());
    assert!(!root.is_removed());
    assert!(ExecutionContext::current().is_none());
}

#[test]
fn current_context_removal_skips_switch() {
    let harness = TestHarness::new();
    let hook = RecordingCleanup::new();
    hook.install(harness.registry(), component_a());

    let _guard = ExecutionContextSwitcher::enter(host());

    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, "conv1");
    harness
        .remove_with_current_context(&mut txn, &root, false)
        .unwrap();

    assert_eq!(hook.events()[0].context, Some(ComponentId::new("Host")));
}

#[test]
fn switching_can_be_disabled() {
    let harness =
        TestHarness::with_config(ManagerConfig::new().switch_context_on_remove(false));
    let hook = RecordingCleanup::new();
    hook.install(harness.registry(), component_a());

    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, "conv1");
    harness.remove(&mut txn, &root, false).unwrap();

    assert_eq!(hook.events()[0].context, None);
}

#[test]
fn unregistered_component_cannot_be_removed() {
    let harness = TestHarness::new();
    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, "conv1");
    harness.registry().unregister(&component_a());

    let err = harness.remove(&mut txn, &root, false).unwrap_err();
    let CoreError::RemovalFailure { source, .. } = &err else {
        panic!("expected RemovalFailure, got {err:?}");
    };
    assert!(source.to_string().contains("unknown component"));
    assert!(!root.is_removed());
    harness.commit(&mut txn).unwrap();
    assert!(harness.store().contains(root.id()));
}
