//! Property-based test generators using proptest.
//!
//! Provides strategies for generating identifiers, tree shapes and
//! sequences of lifecycle operations.

use entislee_core::{ComponentId, EntityId, EntityKind, ServiceId};
use proptest::prelude::*;
use proptest::sample::Index;
use uuid::Uuid;

/// Strategy for generating service IDs.
pub fn service_id_strategy() -> impl Strategy<Value = ServiceId> {
    prop::string::string_regex("[A-Z][A-Za-z0-9]{0,15}")
        .expect("Invalid regex")
        .prop_map(ServiceId::new)
}

/// Strategy for generating component IDs.
pub fn component_id_strategy() -> impl Strategy<Value = ComponentId> {
    prop::string::string_regex("[A-Z][A-Za-z0-9]{0,15}")
        .expect("Invalid regex")
        .prop_map(ComponentId::new)
}

/// Strategy for generating relation slot names.
pub fn relation_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][A-Za-z]{0,11}").expect("Invalid regex")
}

/// Strategy for generating convergence names.
pub fn convergence_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]{1,8}").expect("Invalid regex")
}

/// Strategy for generating entity IDs of either kind.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    (service_id_strategy(), any::<bool>(), any::<u128>()).prop_map(|(service, root, token)| {
        let kind = if root {
            EntityKind::Root
        } else {
            EntityKind::NonRoot
        };
        EntityId::new(service, kind, Uuid::from_u128(token))
    })
}

/// Strategy for generating tree shapes.
///
/// Element `i` is the index of the parent of node `i + 1`; node 0 is the
/// root. Every parent index is smaller than its child's, so the shape is
/// always a single tree.
pub fn tree_shape_strategy(max_children: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(any::<Index>(), 0..max_children).prop_map(|picks| {
        picks
            .iter()
            .enumerate()
            .map(|(i, pick)| pick.index(i + 1))
            .collect()
    })
}

/// A single step in a generated lifecycle workload.
#[derive(Debug, Clone)]
pub enum LifecycleOp {
    /// Create a new root.
    CreateRoot,
    /// Create a child of an existing entity.
    CreateChild {
        /// Which known entity becomes the parent.
        parent: Index,
    },
    /// Look up a known entity.
    Get {
        /// Which known entity to look up.
        target: Index,
    },
    /// Remove a known entity.
    Remove {
        /// Which known entity to remove.
        target: Index,
        /// Whether to detach it from its parent slot.
        from_parent: bool,
    },
}

/// Strategy for generating a single lifecycle operation.
pub fn lifecycle_op_strategy() -> impl Strategy<Value = LifecycleOp> {
    prop_oneof![
        2 => Just(LifecycleOp::CreateRoot),
        4 => any::<Index>().prop_map(|parent| LifecycleOp::CreateChild { parent }),
        3 => any::<Index>().prop_map(|target| LifecycleOp::Get { target }),
        2 => (any::<Index>(), any::<bool>())
            .prop_map(|(target, from_parent)| LifecycleOp::Remove { target, from_parent }),
    ]
}

/// Strategy for generating a sequence of lifecycle operations.
pub fn lifecycle_ops_strategy(max_ops: usize) -> impl Strategy<Value = Vec<LifecycleOp>> {
    prop::collection::vec(lifecycle_op_strategy(), 1..max_ops)
}
