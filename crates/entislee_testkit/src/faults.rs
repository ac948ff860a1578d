//! Fault injection for store-facing tests.
//!
//! [`FailingStore`] forwards to an [`InMemoryEntityStore`] until a
//! [`FaultPoint`] is armed, after which that operation returns
//! [`StoreError::Unavailable`]. A committed batch fails as a whole if any
//! of its ops hits an armed point, and then leaves the store untouched.

use entislee_core::{
    EntityId, EntityRecord, InMemoryEntityStore, PersistentEntityStore, StoreError, StoreOp,
    StoreResult,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// [`PersistentEntityStore::load`]
    Load,
    /// [`PersistentEntityStore::save`]
    Save,
    /// [`PersistentEntityStore::delete`]
    Delete,
    /// [`PersistentEntityStore::attach_to_parent`]
    Attach,
    /// [`PersistentEntityStore::detach_from_parent`]
    Detach,
    /// [`PersistentEntityStore::children_of`]
    Children,
}

/// A store wrapper that fails armed operations.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: InMemoryEntityStore,
    armed: Mutex<HashSet<FaultPoint>>,
    injected: AtomicUsize,
}

impl FailingStore {
    /// Creates a store with no faults armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `point` fail until [`heal`](Self::heal) is called.
    pub fn arm(&self, point: FaultPoint) {
        self.armed.lock().insert(point);
    }

    /// Stops `point` from failing.
    pub fn heal(&self, point: FaultPoint) {
        self.armed.lock().remove(&point);
    }

    /// Stops every fault.
    pub fn heal_all(&self) {
        self.armed.lock().clear();
    }

    /// Returns how many operations failed because of an armed fault.
    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::Relaxed)
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &InMemoryEntityStore {
        &self.inner
    }

    fn check(&self, point: FaultPoint) -> StoreResult<()> {
        if self.armed.lock().contains(&point) {
            self.injected.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(?point, "injecting store fault");
            return Err(StoreError::unavailable(format!("injected {point:?} fault")));
        }
        Ok(())
    }
}

impl PersistentEntityStore for FailingStore {
    fn load(&self, id: &EntityId) -> StoreResult<Option<EntityRecord>> {
        self.check(FaultPoint::Load)?;
        self.inner.load(id)
    }

    fn save(&self, record: &EntityRecord) -> StoreResult<()> {
        self.check(FaultPoint::Save)?;
        self.inner.save(record)
    }

    fn delete(&self, id: &EntityId) -> StoreResult<bool> {
        self.check(FaultPoint::Delete)?;
        self.inner.delete(id)
    }

    fn attach_to_parent(
        &self,
        parent: &EntityId,
        relation: &str,
        child: &EntityId,
    ) -> StoreResult<bool> {
        self.check(FaultPoint::Attach)?;
        self.inner.attach_to_parent(parent, relation, child)
    }

    fn detach_from_parent(
        &self,
        parent: &EntityId,
        relation: &str,
        child: &EntityId,
    ) -> StoreResult<bool> {
        self.check(FaultPoint::Detach)?;
        self.inner.detach_from_parent(parent, relation, child)
    }

    fn children_of(&self, parent: &EntityId) -> StoreResult<Vec<EntityRecord>> {
        self.check(FaultPoint::Children)?;
        self.inner.children_of(parent)
    }

    fn apply(&self, ops: &[StoreOp]) -> StoreResult<()> {
        for op in ops {
            self.check(match op {
                StoreOp::Save(_) => FaultPoint::Save,
                StoreOp::Delete(_) => FaultPoint::Delete,
                StoreOp::Attach { .. } => FaultPoint::Attach,
                StoreOp::Detach { .. } => FaultPoint::Detach,
            })?;
        }
        self.inner.apply(ops)
    }
}
