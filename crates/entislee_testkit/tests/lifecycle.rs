//! End-to-end lifecycle tests against the in-memory store.

use entislee_core::{
    ComponentId, CoreError, EntityId, EntityKind, ManagerConfig, ParentLink, ServiceId,
};
use entislee_testkit::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[test]
fn root_scenario() {
    let harness = TestHarness::new();
    let mut txn = harness.begin();

    let root = harness
        .manager
        .create_root(
            &mut txn,
            &ComponentId::new("SbbA"),
            &ServiceId::new("Svc1"),
            "conv1",
        )
        .unwrap();

    let id = root.id().to_string();
    let parts: Vec<&str> = id.split(':').collect();
    assert_eq!(parts[..2], ["Svc1", "root"]);
    assert!(Uuid::parse_str(parts[2]).is_ok());
    assert!(root.parent_id().is_none());
    assert_eq!(root.root_id(), root.id());

    let again = harness.get(&mut txn, root.id()).unwrap();
    assert!(Arc::ptr_eq(&root, &again));

    harness.remove(&mut txn, &root, false).unwrap();
    let err = harness.get(&mut txn, root.id()).unwrap_err();
    assert!(matches!(err, CoreError::EntityNotFound { .. }));
}

#[test]
fn child_scenario() {
    let harness = TestHarness::new();
    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, "conv1");
    let parent = harness.create_child(&mut txn, &root, "middle");

    let link = ParentLink::new(parent.id().clone(), "childSlot", root.id().clone());
    let child = harness
        .manager
        .create_child(
            &mut txn,
            &ComponentId::new("SbbB"),
            &ServiceId::new("Svc1"),
            &link,
            "conv1",
        )
        .unwrap();

    assert_eq!(child.id().kind(), EntityKind::NonRoot);
    assert!(child.id().to_string().starts_with("Svc1:nonroot:"));
    assert_eq!(child.parent_id(), Some(parent.id()));
    assert_eq!(child.root_id(), root.id());
    assert_eq!(child.parent_relation(), Some("childSlot"));
}

#[test]
fn same_transaction_returns_same_instance() {
    let harness = TestHarness::new();
    let id = harness.committed_root("conv1");

    let mut txn = harness.begin();
    let first = harness.get(&mut txn, &id).unwrap();
    let second = harness.get(&mut txn, &id).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn distinct_transactions_get_distinct_instances() {
    let harness = TestHarness::new();
    let id = harness.committed_root("conv1");

    let mut t1 = harness.begin();
    let mut t2 = harness.begin();
    let a = harness.get(&mut t1, &id).unwrap();
    let b = harness.get(&mut t2, &id).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert!(a.same_fields(&b));
    assert_eq!(a.convergence_name(), b.convergence_name());
    assert_eq!(a.root_id(), b.root_id());
}

#[test]
fn removal_in_one_transaction_does_not_touch_other_instances() {
    let harness = TestHarness::new();
    let id = harness.committed_root("conv1");

    let mut t1 = harness.begin();
    let mut t2 = harness.begin();
    let seen_by_t2 = harness.get(&mut t2, &id).unwrap();

    harness.remove_by_id(&mut t1, &id, false).unwrap();

    assert!(!seen_by_t2.is_removed());
    // Still cached in t2.
    assert!(Arc::ptr_eq(&harness.get(&mut t2, &id).unwrap(), &seen_by_t2));
}

#[test]
fn lookup_after_commit_rehydrates() {
    let harness = TestHarness::new();
    let mut txn = harness.begin();
    let created = harness.create_root(&mut txn, "conv1");
    harness.commit(&mut txn).unwrap();

    let mut next = harness.begin();
    let loaded = harness.get(&mut next, created.id()).unwrap();
    assert!(!Arc::ptr_eq(&created, &loaded));
    assert!(created.same_fields(&loaded));
    assert_eq!(loaded.transaction_id(), next.id());
}

#[test]
fn unknown_id_is_not_found() {
    let harness = TestHarness::new();
    let mut txn = harness.begin();
    let id = EntityId::root(service(), Uuid::from_u128(u128::MAX));

    let err = harness.get(&mut txn, &id).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(harness.stats().snapshot().not_found, 1);
}

#[test]
fn ended_transaction_rejects_every_operation() {
    let harness = TestHarness::new();
    let mut live = harness.begin();
    let root = harness.create_root(&mut live, "conv1");

    for finish in [true, false] {
        let mut txn = harness.begin();
        if finish {
            harness.commit(&mut txn).unwrap();
        } else {
            harness.rollback(&mut txn).unwrap();
        }

        assert!(matches!(
            harness
                .manager
                .create_root(&mut txn, &component_a(), &service(), "c"),
            Err(CoreError::NoActiveTransaction)
        ));
        assert!(matches!(
            harness.manager.create_child(
                &mut txn,
                &component_b(),
                &service(),
                &ParentLink::of(&root, "s"),
                "c"
            ),
            Err(CoreError::NoActiveTransaction)
        ));
        assert!(matches!(
            harness.get(&mut txn, root.id()),
            Err(CoreError::NoActiveTransaction)
        ));
        assert!(matches!(
            harness.remove(&mut txn, &root, true),
            Err(CoreError::NoActiveTransaction)
        ));
        assert!(matches!(
            harness.remove_with_current_context(&mut txn, &root, true),
            Err(CoreError::NoActiveTransaction)
        ));
        assert!(matches!(
            harness.children(&mut txn, root.id()),
            Err(CoreError::NoActiveTransaction)
        ));
    }
}

#[test]
fn cascade_removes_whole_subtree() {
    let harness = TestHarness::new();
    let mut setup = harness.begin();
    let root_id = scenarios::build_tree(&harness, &mut setup, 3, 2)[0].id().clone();
    harness.commit(&mut setup).unwrap();
    assert_eq!(harness.store().len(), 15);

    let mut txn = harness.begin();
    harness.remove_by_id(&mut txn, &root_id, false).unwrap();

    assert_eq!(txn.cached_count(), 0);
    assert_eq!(harness.store().len(), 15);
    harness.commit(&mut txn).unwrap();
    assert!(harness.store().is_empty());

    let snapshot = harness.stats().snapshot();
    assert_eq!(snapshot.removals, 1);
    assert_eq!(snapshot.cascaded_removals, 14);
}

#[test]
fn cascade_within_creating_transaction_marks_every_node() {
    let harness = TestHarness::new();
    let mut txn = harness.begin();
    let tree = scenarios::build_tree(&harness, &mut txn, 2, 2);

    harness.remove(&mut txn, &tree[0], false).unwrap();

    assert!(tree.iter().all(|entity| entity.is_removed()));
    assert_eq!(txn.cached_count(), 0);
    harness.commit(&mut txn).unwrap();
    assert!(harness.store().is_empty());
}

#[test]
fn rolled_back_cascade_leaves_tree_intact() {
    let harness = TestHarness::new();
    let mut setup = harness.begin();
    let root_id = scenarios::build_tree(&harness, &mut setup, 2, 3)[0].id().clone();
    harness.commit(&mut setup).unwrap();

    let mut txn = harness.begin();
    harness.remove_by_id(&mut txn, &root_id, false).unwrap();
    harness.rollback(&mut txn).unwrap();

    assert_eq!(harness.store().len(), scenarios::tree_size(2, 3));
    let mut next = harness.begin();
    let root = harness.get(&mut next, &root_id).unwrap();
    assert_eq!(harness.children(&mut next, root.id()).unwrap().len(), 3);
}

#[test]
fn concurrent_transaction_sees_only_committed_entities() {
    let harness = TestHarness::new();
    let parent_id = harness.committed_root("conv1");

    let mut writer = harness.begin();
    let mut reader = harness.begin();
    let parent = harness.get(&mut writer, &parent_id).unwrap();
    let child = harness.create_child(&mut writer, &parent, "slot");

    assert!(harness.get(&mut reader, child.id()).unwrap_err().is_not_found());
    assert!(harness.children(&mut reader, &parent_id).unwrap().is_empty());

    harness.commit(&mut writer).unwrap();
    let children = harness.children(&mut reader, &parent_id).unwrap();
    assert_eq!(children.len(), 1);
    assert!(children[0].same_fields(&child));
    assert!(!Arc::ptr_eq(&children[0], &child));
}

#[test]
fn removing_middle_node_leaves_siblings() {
    let harness = TestHarness::new();
    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, "conv1");
    let left = harness.create_child(&mut txn, &root, "slot");
    let right = harness.create_child(&mut txn, &root, "slot");
    let leaf = harness.create_child(&mut txn, &left, "slot");

    harness.remove(&mut txn, &left, true).unwrap();

    assert!(leaf.is_removed());
    assert!(!right.is_removed());
    let remaining = harness.children(&mut txn, root.id()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(Arc::ptr_eq(&remaining[0], &right));

    harness.commit(&mut txn).unwrap();
    let parent_record = harness.store().records().into_iter().find(|r| r.id == *root.id());
    let parent_record = parent_record.unwrap();
    assert_eq!(
        parent_record.children_in("slot").collect::<Vec<_>>(),
        vec![right.id()]
    );
}

#[test]
fn non_cascading_removal_orphans_children() {
    let harness = TestHarness::with_config(ManagerConfig::new().cascade_removal(false));
    let mut txn = harness.begin();
    let root = harness.create_root(&mut txn, "conv1");
    let child = harness.create_child(&mut txn, &root, "slot");

    harness.remove(&mut txn, &root, false).unwrap();

    assert!(!child.is_removed());
    let reloaded = harness.get(&mut txn, child.id()).unwrap();
    assert_eq!(reloaded.parent_id(), Some(root.id()));
}

#[test]
fn transaction_helper_rolls_back_on_error() {
    let harness = TestHarness::new();

    let result: Result<(), CoreError> = harness.transaction(|txn| {
        harness
            .manager
            .create_root(txn, &component_a(), &service(), "conv1")?;
        Err(CoreError::invalid_operation("abort"))
    });

    assert!(result.is_err());
    assert_eq!(harness.transactions().active_count(), 0);
    assert!(harness.store().is_empty());
}
