//! Writes buffered by an active transaction.
//!
//! Nothing a transaction does reaches the store before commit. Record
//! creations and deletions are keyed by entity ID, so the last write for an
//! ID wins; slot edits are kept in issue order and replayed.

use crate::entity::EntityId;
use crate::store::{EntityRecord, StoreOp};
use std::collections::HashMap;

/// A buffered change to one entity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingWrite {
    /// The record was created in this transaction.
    Save(EntityRecord),
    /// The stored record is to be deleted.
    Delete,
}

/// The pending writes of one transaction.
#[derive(Debug, Default)]
pub(crate) struct WriteSet {
    records: HashMap<EntityId, PendingWrite>,
    slots: Vec<StoreOp>,
}

impl WriteSet {
    /// Buffers the creation of `record`.
    pub(crate) fn save(&mut self, record: EntityRecord) {
        self.records
            .insert(record.id.clone(), PendingWrite::Save(record));
    }

    /// Buffers the deletion of `id`.
    ///
    /// Deleting a record created in this transaction drops the creation
    /// instead; the store never sees either.
    pub(crate) fn delete(&mut self, id: &EntityId) {
        if let Some(PendingWrite::Save(_)) = self.records.remove(id) {
            return;
        }
        self.records.insert(id.clone(), PendingWrite::Delete);
    }

    /// Buffers adding `child` to the parent's slot `relation`.
    pub(crate) fn attach(&mut self, parent: &EntityId, relation: &str, child: &EntityId) {
        self.slots.push(StoreOp::Attach {
            parent: parent.clone(),
            relation: relation.to_owned(),
            child: child.clone(),
        });
    }

    /// Buffers removing `child` from the parent's slot `relation`.
    pub(crate) fn detach(&mut self, parent: &EntityId, relation: &str, child: &EntityId) {
        self.slots.push(StoreOp::Detach {
            parent: parent.clone(),
            relation: relation.to_owned(),
            child: child.clone(),
        });
    }

    /// Returns the pending write for `id`, if any.
    pub(crate) fn get(&self, id: &EntityId) -> Option<&PendingWrite> {
        self.records.get(id)
    }

    /// Returns true if `id` is pending deletion.
    pub(crate) fn is_deleted(&self, id: &EntityId) -> bool {
        matches!(self.records.get(id), Some(PendingWrite::Delete))
    }

    /// Returns the records created in this transaction under `parent`.
    pub(crate) fn created_children<'a>(
        &'a self,
        parent: &'a EntityId,
    ) -> impl Iterator<Item = &'a EntityRecord> + 'a {
        self.records.values().filter_map(move |write| match write {
            PendingWrite::Save(record) if record.linkage.parent_id() == Some(parent) => {
                Some(record)
            }
            _ => None,
        })
    }

    /// Returns the outcome of the last buffered edit of one slot entry.
    ///
    /// `Some(true)` if the last edit attached `child`, `Some(false)` if it
    /// detached it, `None` if this transaction never touched the entry.
    pub(crate) fn slot_edit(
        &self,
        parent: &EntityId,
        relation: &str,
        child: &EntityId,
    ) -> Option<bool> {
        self.slots.iter().rev().find_map(|op| match op {
            StoreOp::Attach {
                parent: p,
                relation: r,
                child: c,
            } if p == parent && r == relation && c == child => Some(true),
            StoreOp::Detach {
                parent: p,
                relation: r,
                child: c,
            } if p == parent && r == relation && c == child => Some(false),
            _ => None,
        })
    }

    /// Returns the number of buffered writes.
    pub(crate) fn len(&self) -> usize {
        self.records.len() + self.slots.len()
    }

    /// Returns true if nothing is buffered.
    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty() && self.slots.is_empty()
    }

    /// Lays the writes out for the store: saves, then slot edits in issue
    /// order, then deletes.
    ///
    /// Saves go first so edits to slots of parents created in this
    /// transaction find their record.
    pub(crate) fn to_ops(&self) -> Vec<StoreOp> {
        let mut saves = Vec::new();
        let mut deletes = Vec::new();
        for (id, write) in &self.records {
            match write {
                PendingWrite::Save(record) => saves.push(StoreOp::Save(record.clone())),
                PendingWrite::Delete => deletes.push(StoreOp::Delete(id.clone())),
            }
        }
        saves.sort_by(|a, b| a.target().cmp(b.target()));
        deletes.sort_by(|a, b| a.target().cmp(b.target()));

        let mut ops = saves;
        ops.extend(self.slots.iter().cloned());
        ops.extend(deletes);
        ops
    }

    /// Drops every buffered write.
    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{Linkage, ParentLink};
    use crate::types::{ComponentId, ServiceId};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn record(n: u128, parent: Option<&EntityId>) -> EntityRecord {
        let service = ServiceId::new("Svc1");
        let (id, linkage) = match parent {
            None => (EntityId::root(service.clone(), Uuid::from_u128(n)), Linkage::Root),
            Some(parent) => (
                EntityId::non_root(service.clone(), Uuid::from_u128(n)),
                Linkage::Child(ParentLink::new(parent.clone(), "slot", parent.clone())),
            ),
        };
        EntityRecord {
            id,
            linkage,
            component_id: ComponentId::new("SbbA"),
            service_id: service,
            convergence_name: "conv1".into(),
            child_relations: BTreeMap::new(),
        }
    }

    #[test]
    fn delete_after_save_cancels_out() {
        let mut writes = WriteSet::default();
        let root = record(1, None);
        writes.save(root.clone());
        writes.delete(&root.id);

        assert!(writes.is_empty());
        assert!(writes.get(&root.id).is_none());
    }

    #[test]
    fn delete_of_stored_record_is_kept() {
        let mut writes = WriteSet::default();
        let id = record(1, None).id;
        writes.delete(&id);

        assert!(writes.is_deleted(&id));
        assert_eq!(writes.to_ops(), vec![StoreOp::Delete(id)]);
    }

    #[test]
    fn last_slot_edit_wins() {
        let mut writes = WriteSet::default();
        let parent = record(1, None).id;
        let child = record(2, Some(&parent)).id;

        assert_eq!(writes.slot_edit(&parent, "slot", &child), None);
        writes.attach(&parent, "slot", &child);
        assert_eq!(writes.slot_edit(&parent, "slot", &child), Some(true));
        writes.detach(&parent, "slot", &child);
        assert_eq!(writes.slot_edit(&parent, "slot", &child), Some(false));
        assert_eq!(writes.slot_edit(&parent, "other", &child), None);
    }

    #[test]
    fn ops_put_saves_before_slots_and_deletes_last() {
        let mut writes = WriteSet::default();
        let stale = record(9, None).id;
        let root = record(1, None);
        let child = record(2, Some(&root.id));

        writes.delete(&stale);
        writes.save(root.clone());
        writes.save(child.clone());
        writes.attach(&root.id, "slot", &child.id);

        let ops = writes.to_ops();
        assert_eq!(ops.len(), 4);
        assert!(matches!(&ops[0], StoreOp::Save(r) if r.id == root.id));
        assert!(matches!(&ops[1], StoreOp::Save(r) if r.id == child.id));
        assert!(matches!(&ops[2], StoreOp::Attach { .. }));
        assert_eq!(ops[3], StoreOp::Delete(stale));
    }

    #[test]
    fn created_children_filters_by_parent() {
        let mut writes = WriteSet::default();
        let root = record(1, None);
        let other = record(5, None);
        let child = record(2, Some(&root.id));
        writes.save(root.clone());
        writes.save(other.clone());
        writes.save(child.clone());
        writes.save(record(3, Some(&other.id)));

        let ids: Vec<_> = writes.created_children(&root.id).map(|r| &r.id).collect();
        assert_eq!(ids, vec![&child.id]);
    }
}
