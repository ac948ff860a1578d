//! CLI command implementations.

pub mod scenario;
pub mod tree;

use entislee_core::{
    ComponentId, ComponentRegistry, EntityLifecycleManager, ExecutionContext, InMemoryEntityStore,
};
use std::sync::Arc;

/// Component owning root entities.
pub const ROOT_COMPONENT: &str = "SbbA";
/// Component owning child entities.
pub const CHILD_COMPONENT: &str = "SbbB";

/// A manager over a fresh in-memory store with both CLI components registered.
pub fn manager() -> (EntityLifecycleManager, Arc<InMemoryEntityStore>) {
    let store = Arc::new(InMemoryEntityStore::new());
    let registry = Arc::new(ComponentRegistry::new());
    for name in [ROOT_COMPONENT, CHILD_COMPONENT] {
        registry.register(ExecutionContext::new(ComponentId::new(name)).with_cleanup(
            |entity: &entislee_core::Entity| -> Result<(), entislee_core::BoxedCause> {
                tracing::info!(entity = %entity.id(), "cleaning up entity");
                Ok(())
            },
        ));
    }
    let manager = EntityLifecycleManager::builder(store.clone())
        .resolver(registry)
        .build();
    (manager, store)
}
