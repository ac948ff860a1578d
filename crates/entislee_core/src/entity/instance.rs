//! Materialized entity instances.

use crate::entity::EntityId;
use crate::hierarchy::Linkage;
use crate::store::EntityRecord;
use crate::types::{ComponentId, ServiceId, TransactionId};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Lifecycle state of a materialized entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// The entity is live within its transaction.
    Materialized,
    /// The entity has been removed; the instance must not be used further.
    Removed,
}

/// A transactional, hierarchically linked instance of a component.
///
/// Every instance belongs to exactly one transaction: the one that created
/// or materialized it. Instances are handed out as `Arc<Entity>` and a
/// transaction always returns the same `Arc` for the same ID, so pointer
/// identity (`Arc::ptr_eq`) is meaningful within a transaction and never
/// holds across transactions.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    linkage: Linkage,
    component_id: ComponentId,
    service_id: ServiceId,
    convergence_name: String,
    txn_id: TransactionId,
    state: Mutex<LifecycleState>,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        linkage: Linkage,
        component_id: ComponentId,
        service_id: ServiceId,
        convergence_name: String,
        txn_id: TransactionId,
    ) -> Self {
        Self {
            id,
            linkage,
            component_id,
            service_id,
            convergence_name,
            txn_id,
            state: Mutex::new(LifecycleState::Materialized),
        }
    }

    /// Re-hydrates an entity from its persisted record.
    pub(crate) fn from_record(record: EntityRecord, txn_id: TransactionId) -> Self {
        Self::new(
            record.id,
            record.linkage,
            record.component_id,
            record.service_id,
            record.convergence_name,
            txn_id,
        )
    }

    /// Builds the persisted form of a freshly created entity.
    ///
    /// Child slots start empty; the store maintains them afterwards.
    pub(crate) fn to_record(&self) -> EntityRecord {
        EntityRecord {
            id: self.id.clone(),
            linkage: self.linkage.clone(),
            component_id: self.component_id.clone(),
            service_id: self.service_id.clone(),
            convergence_name: self.convergence_name.clone(),
            child_relations: BTreeMap::new(),
        }
    }

    /// Returns the entity ID.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Returns the hierarchy linkage.
    #[must_use]
    pub fn linkage(&self) -> &Linkage {
        &self.linkage
    }

    /// Returns the parent ID, if this is a non-root entity.
    #[must_use]
    pub fn parent_id(&self) -> Option<&EntityId> {
        self.linkage.parent_id()
    }

    /// Returns the name of the parent's relation slot holding this entity.
    #[must_use]
    pub fn parent_relation(&self) -> Option<&str> {
        self.linkage.relation()
    }

    /// Returns the ID of the root of this entity's tree.
    #[must_use]
    pub fn root_id(&self) -> &EntityId {
        self.linkage.root_id(&self.id)
    }

    /// Returns true if this entity anchors its own tree.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.linkage.is_root()
    }

    /// Returns the component this entity instantiates.
    #[must_use]
    pub fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    /// Returns the owning service.
    #[must_use]
    pub fn service_id(&self) -> &ServiceId {
        &self.service_id
    }

    /// Returns the convergence name.
    #[must_use]
    pub fn convergence_name(&self) -> &str {
        &self.convergence_name
    }

    /// Returns the transaction this instance belongs to.
    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        self.txn_id
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Returns true once the entity has been removed.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.state() == LifecycleState::Removed
    }

    pub(crate) fn mark_removed(&self) {
        *self.state.lock() = LifecycleState::Removed;
    }

    /// Returns true if both instances describe the same persisted entity.
    ///
    /// This compares observable fields, not identity; two transactions
    /// holding the same entity see distinct but field-equal instances.
    #[must_use]
    pub fn same_fields(&self, other: &Entity) -> bool {
        self.id == other.id
            && self.linkage == other.linkage
            && self.component_id == other.component_id
            && self.service_id == other.service_id
            && self.convergence_name == other.convergence_name
    }
}
