//! In-memory entity store.

use crate::entity::EntityId;
use crate::store::backend::PersistentEntityStore;
use crate::store::error::{StoreError, StoreResult};
use crate::store::op::StoreOp;
use crate::store::record::EntityRecord;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory entity store.
///
/// This store keeps all records in memory and is suitable for:
/// - Unit and integration tests
/// - Tooling and demonstrations
///
/// Direct writes are applied immediately. Batches passed to
/// [`PersistentEntityStore::apply`] are validated first and then applied
/// under a single write lock, so readers never see half a commit.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across transactions.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    records: RwLock<HashMap<EntityId, EntityRecord>>,
}

impl InMemoryEntityStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = EntityRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns true if a record is stored under `id`.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.records.read().contains_key(id)
    }

    /// Returns a copy of every stored record, ordered by ID.
    #[must_use]
    pub fn records(&self) -> Vec<EntityRecord> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}

fn check_parent(record: &EntityRecord) -> StoreResult<()> {
    if record.linkage.parent_id() == Some(&record.id) {
        return Err(StoreError::corrupted(format!(
            "entity {} cannot be its own parent",
            record.id
        )));
    }
    Ok(())
}

fn attach_slot(
    records: &mut HashMap<EntityId, EntityRecord>,
    parent: &EntityId,
    relation: &str,
    child: &EntityId,
) -> bool {
    let Some(record) = records.get_mut(parent) else {
        return false;
    };
    record
        .child_relations
        .entry(relation.to_owned())
        .or_default()
        .insert(child.clone());
    true
}

fn detach_slot(
    records: &mut HashMap<EntityId, EntityRecord>,
    parent: &EntityId,
    relation: &str,
    child: &EntityId,
) -> bool {
    let Some(record) = records.get_mut(parent) else {
        return false;
    };
    let Some(slot) = record.child_relations.get_mut(relation) else {
        return false;
    };
    let removed = slot.remove(child);
    if slot.is_empty() {
        record.child_relations.remove(relation);
    }
    removed
}

impl PersistentEntityStore for InMemoryEntityStore {
    fn load(&self, id: &EntityId) -> StoreResult<Option<EntityRecord>> {
        Ok(self.records.read().get(id).cloned())
    }

    fn save(&self, record: &EntityRecord) -> StoreResult<()> {
        check_parent(record)?;
        self.records
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, id: &EntityId) -> StoreResult<bool> {
        Ok(self.records.write().remove(id).is_some())
    }

    fn attach_to_parent(
        &self,
        parent: &EntityId,
        relation: &str,
        child: &EntityId,
    ) -> StoreResult<bool> {
        Ok(attach_slot(&mut self.records.write(), parent, relation, child))
    }

    fn detach_from_parent(
        &self,
        parent: &EntityId,
        relation: &str,
        child: &EntityId,
    ) -> StoreResult<bool> {
        Ok(detach_slot(&mut self.records.write(), parent, relation, child))
    }

    fn children_of(&self, parent: &EntityId) -> StoreResult<Vec<EntityRecord>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|record| record.linkage.parent_id() == Some(parent))
            .cloned()
            .collect())
    }

    /// Validates the whole batch, then applies it under one write lock.
    fn apply(&self, ops: &[StoreOp]) -> StoreResult<()> {
        for op in ops {
            if let StoreOp::Save(record) = op {
                check_parent(record)?;
            }
        }

        let mut records = self.records.write();
        for op in ops {
            match op {
                StoreOp::Save(record) => {
                    records.insert(record.id.clone(), record.clone());
                }
                StoreOp::Delete(id) => {
                    records.remove(id);
                }
                StoreOp::Attach {
                    parent,
                    relation,
                    child,
                } => {
                    attach_slot(&mut records, parent, relation, child);
                }
                StoreOp::Detach {
                    parent,
                    relation,
                    child,
                } => {
                    detach_slot(&mut records, parent, relation, child);
                }
            }
        }
        Ok(())
    }
}
