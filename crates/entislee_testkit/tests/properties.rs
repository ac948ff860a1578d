//! Property tests for lifecycle invariants.

use entislee_core::Entity;
use entislee_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

/// Builds a tree from a shape and returns every node, root first.
fn build_shape(
    harness: &TestHarness,
    txn: &mut entislee_core::TransactionContext,
    shape: &[usize],
) -> Vec<Arc<Entity>> {
    let mut nodes = vec![harness.create_root(txn, "prop")];
    for &parent in shape {
        let child = harness.create_child(txn, &nodes[parent], "child");
        nodes.push(child);
    }
    nodes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn children_share_their_roots_root(shape in tree_shape_strategy(24)) {
        let harness = TestHarness::new();
        let mut txn = harness.begin();
        let nodes = build_shape(&harness, &mut txn, &shape);

        for (i, &parent) in shape.iter().enumerate() {
            let child = &nodes[i + 1];
            prop_assert_eq!(child.parent_id(), Some(nodes[parent].id()));
            prop_assert_eq!(child.root_id(), nodes[0].id());
        }
    }

    #[test]
    fn removing_root_clears_the_store(shape in tree_shape_strategy(24)) {
        let harness = TestHarness::new();
        let mut txn = harness.begin();
        let nodes = build_shape(&harness, &mut txn, &shape);

        harness.remove(&mut txn, &nodes[0], false).unwrap();
        harness.commit(&mut txn).unwrap();

        prop_assert!(harness.store().is_empty());
        prop_assert!(nodes.iter().all(|node| node.is_removed()));
        prop_assert_eq!(harness.stats().snapshot().cascaded_removals, shape.len() as u64);
    }

    #[test]
    fn transactions_never_share_instances(shape in tree_shape_strategy(12)) {
        let harness = TestHarness::new();
        let mut setup = harness.begin();
        let ids: Vec<_> = build_shape(&harness, &mut setup, &shape)
            .iter()
            .map(|node| node.id().clone())
            .collect();
        harness.commit(&mut setup).unwrap();

        let mut t1 = harness.begin();
        let mut t2 = harness.begin();
        for id in &ids {
            let a = harness.get(&mut t1, id).unwrap();
            let b = harness.get(&mut t2, id).unwrap();
            prop_assert!(!Arc::ptr_eq(&a, &b));
            prop_assert!(a.same_fields(&b));
            prop_assert!(Arc::ptr_eq(&a, &harness.get(&mut t1, id).unwrap()));
        }
    }

    #[test]
    fn random_workload_matches_model(ops in lifecycle_ops_strategy(40)) {
        let harness = TestHarness::new();
        let mut txn = harness.begin();

        let mut nodes: Vec<Arc<Entity>> = Vec::new();
        let mut parents: Vec<Option<usize>> = Vec::new();
        let mut removed: Vec<bool> = Vec::new();

        for op in ops {
            match op {
                LifecycleOp::CreateRoot => {
                    nodes.push(harness.create_root(&mut txn, "prop"));
                    parents.push(None);
                    removed.push(false);
                }
                LifecycleOp::CreateChild { parent } => {
                    if nodes.is_empty() {
                        continue;
                    }
                    let p = parent.index(nodes.len());
                    if removed[p] {
                        continue;
                    }
                    let child = harness.create_child(&mut txn, &nodes[p], "child");
                    prop_assert_eq!(child.root_id(), nodes[p].root_id());
                    nodes.push(child);
                    parents.push(Some(p));
                    removed.push(false);
                }
                LifecycleOp::Get { target } => {
                    if nodes.is_empty() {
                        continue;
                    }
                    let t = target.index(nodes.len());
                    let result = harness.get(&mut txn, nodes[t].id());
                    if removed[t] {
                        prop_assert!(result.unwrap_err().is_not_found());
                    } else {
                        prop_assert!(Arc::ptr_eq(&result.unwrap(), &nodes[t]));
                    }
                }
                LifecycleOp::Remove { target, from_parent } => {
                    if nodes.is_empty() {
                        continue;
                    }
                    let t = target.index(nodes.len());
                    let result = harness.remove(&mut txn, &nodes[t], from_parent);
                    if removed[t] {
                        prop_assert!(result.unwrap_err().is_not_found());
                        continue;
                    }
                    prop_assert!(result.is_ok());
                    for i in 0..nodes.len() {
                        let mut cursor = Some(i);
                        while let Some(c) = cursor {
                            if c == t {
                                removed[i] = true;
                                break;
                            }
                            cursor = parents[c];
                        }
                    }
                }
            }

            for (node, &gone) in nodes.iter().zip(&removed) {
                prop_assert_eq!(node.is_removed(), gone);
            }
            prop_assert!(harness.store().is_empty());
        }

        let live = removed.iter().filter(|gone| !**gone).count();
        prop_assert_eq!(txn.cached_count(), live);

        harness.commit(&mut txn).unwrap();
        prop_assert_eq!(harness.store().len(), live);
        for (node, &gone) in nodes.iter().zip(&removed) {
            prop_assert_eq!(harness.store().contains(node.id()), !gone);
        }
    }

    #[test]
    fn rolled_back_workload_leaves_no_trace(shape in tree_shape_strategy(16)) {
        let harness = TestHarness::new();
        let mut txn = harness.begin();
        let nodes = build_shape(&harness, &mut txn, &shape);
        harness.remove(&mut txn, &nodes[nodes.len() - 1], true).unwrap();
        harness.rollback(&mut txn).unwrap();

        prop_assert!(harness.store().is_empty());
        let mut next = harness.begin();
        for node in &nodes {
            prop_assert!(harness.get(&mut next, node.id()).unwrap_err().is_not_found());
        }
    }
}
