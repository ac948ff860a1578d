//! Root / non-root linkage between entities.
//!
//! Parent-to-children associations are not indexed in memory. Each entity
//! carries its own [`Linkage`]; a parent's relation slots live in its
//! persisted record, and child enumeration is a query over persisted
//! entities filtered by parent ID, overlaid with the transaction's own
//! uncommitted creations and deletions.

use crate::entity::{Entity, EntityId};
use crate::error::CoreResult;
use crate::store::{EntityRecord, PersistentEntityStore};
use crate::transaction::{PendingWrite, TransactionContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Attachment of a non-root entity to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    parent_id: EntityId,
    relation: String,
    root_id: EntityId,
}

impl ParentLink {
    /// Creates a link from explicit parts.
    ///
    /// `root_id` must equal the parent's root ID; this is not re-validated.
    #[must_use]
    pub fn new(parent_id: EntityId, relation: impl Into<String>, root_id: EntityId) -> Self {
        Self {
            parent_id,
            relation: relation.into(),
            root_id,
        }
    }

    /// Creates a link under `parent`'s slot `relation`, inheriting its root.
    #[must_use]
    pub fn of(parent: &Entity, relation: impl Into<String>) -> Self {
        Self::new(parent.id().clone(), relation, parent.root_id().clone())
    }

    /// Returns the parent ID.
    #[must_use]
    pub fn parent_id(&self) -> &EntityId {
        &self.parent_id
    }

    /// Returns the parent relation slot name.
    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Returns the root ID of the tree.
    #[must_use]
    pub fn root_id(&self) -> &EntityId {
        &self.root_id
    }
}

/// Where an entity sits in its tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Linkage {
    /// The entity is the root; its root ID is its own ID.
    Root,
    /// The entity hangs off a parent.
    Child(ParentLink),
}

impl Linkage {
    /// Returns true for a root linkage.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// Resolves the root ID given the owning entity's own ID.
    #[must_use]
    pub fn root_id<'a>(&'a self, own_id: &'a EntityId) -> &'a EntityId {
        match self {
            Self::Root => own_id,
            Self::Child(link) => link.root_id(),
        }
    }

    /// Returns the parent ID, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<&EntityId> {
        match self {
            Self::Root => None,
            Self::Child(link) => Some(link.parent_id()),
        }
    }

    /// Returns the parent relation slot name, if any.
    #[must_use]
    pub fn relation(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Child(link) => Some(link.relation()),
        }
    }
}

/// Returns true if `id` exists as seen by `txn`.
fn exists(
    store: &dyn PersistentEntityStore,
    txn: &TransactionContext,
    id: &EntityId,
) -> CoreResult<bool> {
    Ok(match txn.writes().get(id) {
        Some(PendingWrite::Save(_)) => true,
        Some(PendingWrite::Delete) => false,
        None => store.load(id)?.is_some(),
    })
}

/// Adds `entity` to its parent's relation slot in `txn`.
///
/// Returns `false` for roots and when the parent does not exist; nothing is
/// recorded then.
pub(crate) fn attach(
    store: &dyn PersistentEntityStore,
    txn: &mut TransactionContext,
    entity: &Entity,
) -> CoreResult<bool> {
    let Linkage::Child(link) = entity.linkage() else {
        return Ok(false);
    };
    if !exists(store, txn, link.parent_id())? {
        return Ok(false);
    }
    txn.writes_mut()?.attach(link.parent_id(), link.relation(), entity.id());
    Ok(true)
}

/// Removes `entity` from its parent's relation slot in `txn`.
///
/// Returns `false` for roots and when the entity was not in the slot.
pub(crate) fn detach(
    store: &dyn PersistentEntityStore,
    txn: &mut TransactionContext,
    entity: &Entity,
) -> CoreResult<bool> {
    let Linkage::Child(link) = entity.linkage() else {
        return Ok(false);
    };
    let (parent, relation) = (link.parent_id(), link.relation());

    let attached = match txn.writes().slot_edit(parent, relation, entity.id()) {
        Some(attached) => attached,
        None => match txn.writes().get(parent) {
            Some(PendingWrite::Save(record)) => {
                record.children_in(relation).any(|id| id == entity.id())
            }
            Some(PendingWrite::Delete) => false,
            None => store
                .load(parent)?
                .is_some_and(|record| record.children_in(relation).any(|id| id == entity.id())),
        },
    };
    if attached {
        txn.writes_mut()?.detach(parent, relation, entity.id());
    }
    Ok(attached)
}

/// Lists the children of `parent` as seen by `txn`, optionally restricted
/// to one slot.
///
/// Stored children pending deletion are left out; children created in
/// `txn` are included.
pub(crate) fn children(
    store: &dyn PersistentEntityStore,
    txn: &TransactionContext,
    parent: &EntityId,
    relation: Option<&str>,
) -> CoreResult<Vec<EntityId>> {
    let in_slot =
        |record: &EntityRecord| relation.is_none_or(|name| record.linkage.relation() == Some(name));
    let writes = txn.writes();

    let mut ids: BTreeSet<EntityId> = store
        .children_of(parent)?
        .into_iter()
        .filter(|record| in_slot(record) && !writes.is_deleted(&record.id))
        .map(|record| record.id)
        .collect();
    ids.extend(
        writes
            .created_children(parent)
            .filter(|&record| in_slot(record))
            .map(|record| record.id.clone()),
    );
    Ok(ids.into_iter().collect())
}
