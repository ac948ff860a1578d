//! Store writes queued by a transaction.

use crate::entity::EntityId;
use crate::store::record::EntityRecord;

/// One write applied to the store when a transaction commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Insert or replace a record.
    Save(EntityRecord),
    /// Delete the record for an ID.
    Delete(EntityId),
    /// Add `child` to the parent's slot `relation`.
    Attach {
        /// Parent entity.
        parent: EntityId,
        /// Slot name.
        relation: String,
        /// Child entity.
        child: EntityId,
    },
    /// Remove `child` from the parent's slot `relation`.
    Detach {
        /// Parent entity.
        parent: EntityId,
        /// Slot name.
        relation: String,
        /// Child entity.
        child: EntityId,
    },
}

impl StoreOp {
    /// Returns the ID of the record this op writes to.
    #[must_use]
    pub fn target(&self) -> &EntityId {
        match self {
            Self::Save(record) => &record.id,
            Self::Delete(id) => id,
            Self::Attach { parent, .. } | Self::Detach { parent, .. } => parent,
        }
    }
}
