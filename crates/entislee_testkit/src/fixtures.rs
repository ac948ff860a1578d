//! Test fixtures and manager helpers.
//!
//! Provides a lifecycle manager wired to an in-memory store with two
//! registered components, plus cleanup hooks that record what they saw.

use entislee_core::{
    BoxedCause, ComponentId, ComponentRegistry, EntityCleanup, Entity, EntityId,
    EntityLifecycleManager, ExecutionContext, InMemoryEntityStore, ManagerConfig, ParentLink,
    SequentialIdGenerator, ServiceId, TransactionContext,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Component owning root entities in fixtures.
pub const COMPONENT_A: &str = "SbbA";
/// Component owning child entities in fixtures.
pub const COMPONENT_B: &str = "SbbB";
/// Service all fixture entities belong to.
pub const SERVICE: &str = "Svc1";

/// A lifecycle manager over an in-memory store.
///
/// Identifier tokens are sequential, so IDs are deterministic across runs.
pub struct TestHarness {
    /// The manager under test.
    pub manager: EntityLifecycleManager,
    store: Arc<InMemoryEntityStore>,
    registry: Arc<ComponentRegistry>,
}

impl TestHarness {
    /// Creates a harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Creates a harness with `config`.
    pub fn with_config(config: ManagerConfig) -> Self {
        let store = Arc::new(InMemoryEntityStore::new());
        let registry = Arc::new(ComponentRegistry::new());
        registry.register(ExecutionContext::new(component_a()));
        registry.register(ExecutionContext::new(component_b()));

        let manager = EntityLifecycleManager::builder(store.clone())
            .resolver(registry.clone())
            .id_generator(Arc::new(SequentialIdGenerator::default()))
            .config(config)
            .build();

        Self {
            manager,
            store,
            registry,
        }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<InMemoryEntityStore> {
        &self.store
    }

    /// Returns the component registry.
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Begins a transaction.
    pub fn begin(&self) -> TransactionContext {
        self.manager.begin().expect("Failed to begin transaction")
    }

    /// Creates a root entity owned by [`COMPONENT_A`].
    pub fn create_root(&self, txn: &mut TransactionContext, convergence_name: &str) -> Arc<Entity> {
        self.manager
            .create_root(txn, &component_a(), &service(), convergence_name)
            .expect("Failed to create root entity")
    }

    /// Creates a child of `parent` in slot `relation`, owned by [`COMPONENT_B`].
    pub fn create_child(
        &self,
        txn: &mut TransactionContext,
        parent: &Entity,
        relation: &str,
    ) -> Arc<Entity> {
        self.manager
            .create_child(
                txn,
                &component_b(),
                &service(),
                &ParentLink::of(parent, relation),
                parent.convergence_name(),
            )
            .expect("Failed to create child entity")
    }

    /// Creates and commits a root entity, returning its ID.
    pub fn committed_root(&self, convergence_name: &str) -> EntityId {
        let mut txn = self.begin();
        let id = self.create_root(&mut txn, convergence_name).id().clone();
        self.manager.commit(&mut txn).expect("Failed to commit");
        id
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestHarness {
    type Target = EntityLifecycleManager;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

/// Returns the [`COMPONENT_A`] ID.
pub fn component_a() -> ComponentId {
    ComponentId::new(COMPONENT_A)
}

/// Returns the [`COMPONENT_B`] ID.
pub fn component_b() -> ComponentId {
    ComponentId::new(COMPONENT_B)
}

/// Returns the [`SERVICE`] ID.
pub fn service() -> ServiceId {
    ServiceId::new(SERVICE)
}

/// One observed cleanup invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupEvent {
    /// Entity being removed.
    pub entity_id: EntityId,
    /// Component whose context was current during cleanup.
    pub context: Option<ComponentId>,
}

/// Cleanup hook that records every call, optionally refusing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingCleanup {
    events: Arc<Mutex<Vec<CleanupEvent>>>,
    refuse: bool,
}

impl RecordingCleanup {
    /// Creates a hook that records and accepts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hook that records and then fails.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Registers this hook as `component`'s cleanup in `registry`.
    pub fn install(&self, registry: &ComponentRegistry, component: ComponentId) {
        registry.register(ExecutionContext::new(component).with_cleanup(self.clone()));
    }

    /// Returns the recorded calls in order.
    pub fn events(&self) -> Vec<CleanupEvent> {
        self.events.lock().clone()
    }

    /// Returns the IDs of the entities cleaned up, in order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.events
            .lock()
            .iter()
            .map(|event| event.entity_id.clone())
            .collect()
    }
}

impl EntityCleanup for RecordingCleanup {
    fn on_remove(&self, entity: &Entity) -> Result<(), BoxedCause> {
        self.events.lock().push(CleanupEvent {
            entity_id: entity.id().clone(),
            context: ExecutionContext::current().map(|ctx| ctx.component_id().clone()),
        });
        if self.refuse {
            Err(format!("cleanup of {} refused", entity.id()).into())
        } else {
            Ok(())
        }
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Builds a complete tree of `depth` levels below a new root, each node
    /// having `fanout` children in slot `"child"`.
    ///
    /// Returns every entity, root first, in creation order.
    pub fn build_tree(
        harness: &TestHarness,
        txn: &mut TransactionContext,
        depth: usize,
        fanout: usize,
    ) -> Vec<Arc<Entity>> {
        let root = harness.create_root(txn, "tree");
        let mut all = vec![Arc::clone(&root)];
        let mut level = vec![root];

        for _ in 0..depth {
            let mut next = Vec::with_capacity(level.len() * fanout);
            for parent in &level {
                for _ in 0..fanout {
                    next.push(harness.create_child(txn, parent, "child"));
                }
            }
            all.extend(next.iter().cloned());
            level = next;
        }

        all
    }

    /// Number of entities [`build_tree`] creates.
    pub fn tree_size(depth: usize, fanout: usize) -> usize {
        (0..=depth).map(|level| fanout.pow(level as u32)).sum()
    }
}
