//! Transaction-scoped entity cache.

use crate::entity::{Entity, EntityId};
use crate::error::{CoreError, CoreResult};
use crate::transaction::TransactionContext;
use std::sync::Arc;

/// Adapter over a transaction context's local entity map.
///
/// The cache owns no storage: the map lives in the [`TransactionContext`],
/// so its contents vanish when the transaction ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionScopedCache;

impl TransactionScopedCache {
    /// Looks up `id` in the transaction's cache.
    pub fn get(&self, txn: &TransactionContext, id: &EntityId) -> CoreResult<Option<Arc<Entity>>> {
        Ok(txn.local_data()?.get(id).cloned())
    }

    /// Caches `entity` under its own ID.
    ///
    /// The entity must have been materialized for this transaction; an
    /// instance owned by another transaction is rejected.
    pub fn put(&self, txn: &mut TransactionContext, entity: Arc<Entity>) -> CoreResult<()> {
        if entity.transaction_id() != txn.id() {
            return Err(CoreError::invalid_operation(format!(
                "entity {} belongs to {}, not {}",
                entity.id(),
                entity.transaction_id(),
                txn.id()
            )));
        }
        txn.local_data_mut()?.insert(entity.id().clone(), entity);
        Ok(())
    }

    /// Evicts `id` from the transaction's cache.
    pub fn remove(
        &self,
        txn: &mut TransactionContext,
        id: &EntityId,
    ) -> CoreResult<Option<Arc<Entity>>> {
        Ok(txn.local_data_mut()?.remove(id))
    }
}
