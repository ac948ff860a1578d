//! Benchmark utilities.

use entislee_core::{
    ComponentId, Entity, EntityId, EntityLifecycleManager, InMemoryEntityStore, ParentLink,
    ServiceId, TransactionContext,
};
use std::sync::Arc;

/// Creates a manager over an empty in-memory store.
pub fn manager() -> EntityLifecycleManager {
    EntityLifecycleManager::builder(Arc::new(InMemoryEntityStore::new())).build()
}

/// Component used for every benchmark entity.
pub fn component() -> ComponentId {
    ComponentId::new("BenchSbb")
}

/// Service used for every benchmark entity.
pub fn service() -> ServiceId {
    ServiceId::new("BenchSvc")
}

/// Commits `count` roots and returns their IDs.
pub fn committed_roots(manager: &EntityLifecycleManager, count: usize) -> Vec<EntityId> {
    manager
        .transaction(|txn| {
            (0..count)
                .map(|_| {
                    manager
                        .create_root(txn, &component(), &service(), "bench")
                        .map(|root| root.id().clone())
                })
                .collect()
        })
        .expect("Failed to populate store")
}

/// Creates a root with `width` direct children in `txn`.
pub fn wide_tree(
    manager: &EntityLifecycleManager,
    txn: &mut TransactionContext,
    width: usize,
) -> Arc<Entity> {
    let root = manager
        .create_root(txn, &component(), &service(), "bench")
        .expect("Failed to create root");
    for _ in 0..width {
        manager
            .create_child(
                txn,
                &component(),
                &service(),
                &ParentLink::of(&root, "child"),
                "bench",
            )
            .expect("Failed to create child");
    }
    root
}
