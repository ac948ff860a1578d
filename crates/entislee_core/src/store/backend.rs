//! Persistent store trait definition.

use crate::entity::EntityId;
use crate::store::error::StoreResult;
use crate::store::op::StoreOp;
use crate::store::record::EntityRecord;

/// Durable home of entity state.
///
/// # Invariants
///
/// - `load` returns the record last passed to `save` for that ID, with any
///   child slots updated by `attach_to_parent` / `detach_from_parent`
/// - `delete` makes the ID unresolvable by `load`
/// - `children_of` returns every stored record whose parent ID matches
/// - `apply` leaves the store as if each op had been issued in order
/// - Implementations must be `Send + Sync`; concurrent transactions share one store
///
/// # Implementors
///
/// - [`super::InMemoryEntityStore`] - For testing and tooling
pub trait PersistentEntityStore: Send + Sync {
    /// Loads the record for `id`, or `None` if it is not stored.
    fn load(&self, id: &EntityId) -> StoreResult<Option<EntityRecord>>;

    /// Inserts or replaces the record keyed by `record.id`.
    fn save(&self, record: &EntityRecord) -> StoreResult<()>;

    /// Deletes the record for `id`.
    ///
    /// Returns `false` if nothing was stored under `id`.
    fn delete(&self, id: &EntityId) -> StoreResult<bool>;

    /// Adds `child` to the parent's slot named `relation`.
    ///
    /// Returns `false` if the parent record does not exist.
    fn attach_to_parent(
        &self,
        parent: &EntityId,
        relation: &str,
        child: &EntityId,
    ) -> StoreResult<bool>;

    /// Removes `child` from the parent's slot named `relation`.
    ///
    /// Returns `false` if the parent or the reference did not exist.
    fn detach_from_parent(
        &self,
        parent: &EntityId,
        relation: &str,
        child: &EntityId,
    ) -> StoreResult<bool>;

    /// Returns the records of all stored entities whose parent is `parent`.
    fn children_of(&self, parent: &EntityId) -> StoreResult<Vec<EntityRecord>>;

    /// Applies the writes of a committing transaction.
    ///
    /// The default issues each op in order and stops at the first error,
    /// so earlier ops stay applied. Stores that can apply a batch all or
    /// nothing should override this.
    fn apply(&self, ops: &[StoreOp]) -> StoreResult<()> {
        for op in ops {
            match op {
                StoreOp::Save(record) => self.save(record)?,
                StoreOp::Delete(id) => {
                    self.delete(id)?;
                }
                StoreOp::Attach {
                    parent,
                    relation,
                    child,
                } => {
                    self.attach_to_parent(parent, relation, child)?;
                }
                StoreOp::Detach {
                    parent,
                    relation,
                    child,
                } => {
                    self.detach_from_parent(parent, relation, child)?;
                }
            }
        }
        Ok(())
    }
}
