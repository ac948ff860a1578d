//! Transaction context.

use crate::entity::{Entity, EntityId};
use crate::error::{CoreError, CoreResult};
use crate::transaction::writes::WriteSet;
use crate::types::TransactionId;
use std::collections::HashMap;
use std::sync::Arc;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// The unit of atomic work, owning a private entity cache and the writes
/// it has not yet committed.
///
/// A context is driven by one thread at a time and passed explicitly to
/// every lifecycle operation. Its local data and pending writes are
/// cleared when the transaction ends and dropped with the context.
///
/// Contexts are only minted by [`crate::TransactionManager::begin`], which
/// guarantees each one a fresh ID:
///
/// ```compile_fail
/// use entislee_core::{TransactionContext, TransactionId};
///
/// let forged = TransactionContext::new(TransactionId::new(1));
/// ```
#[derive(Debug)]
pub struct TransactionContext {
    id: TransactionId,
    state: TransactionState,
    local_data: HashMap<EntityId, Arc<Entity>>,
    writes: WriteSet,
}

impl TransactionContext {
    pub(crate) fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            local_data: HashMap::new(),
            writes: WriteSet::default(),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Fails with [`CoreError::NoActiveTransaction`] unless active.
    pub fn require_active(&self) -> CoreResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(CoreError::NoActiveTransaction)
        }
    }

    /// Returns the transaction-local entity map.
    pub fn local_data(&self) -> CoreResult<&HashMap<EntityId, Arc<Entity>>> {
        self.require_active()?;
        Ok(&self.local_data)
    }

    /// Returns the transaction-local entity map for mutation.
    pub fn local_data_mut(&mut self) -> CoreResult<&mut HashMap<EntityId, Arc<Entity>>> {
        self.require_active()?;
        Ok(&mut self.local_data)
    }

    /// Returns the number of cached entities.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.local_data.len()
    }

    /// Returns the number of writes waiting for commit.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub(crate) fn writes(&self) -> &WriteSet {
        &self.writes
    }

    pub(crate) fn writes_mut(&mut self) -> CoreResult<&mut WriteSet> {
        self.require_active()?;
        Ok(&mut self.writes)
    }

    /// Ends the transaction, discarding its cache and pending writes.
    pub(crate) fn finish(&mut self, state: TransactionState) -> CoreResult<()> {
        self.require_active()?;
        self.state = state;
        self.local_data.clear();
        self.writes.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceId;
    use uuid::Uuid;

    #[test]
    fn new_context_is_active() {
        let txn = TransactionContext::new(TransactionId::new(1));
        assert!(txn.is_active());
        assert!(txn.require_active().is_ok());
        assert_eq!(txn.cached_count(), 0);
        assert_eq!(txn.write_count(), 0);
    }

    #[test]
    fn finished_context_rejects_access() {
        let mut txn = TransactionContext::new(TransactionId::new(1));
        txn.finish(TransactionState::Committed).unwrap();

        assert_eq!(txn.state(), TransactionState::Committed);
        assert!(matches!(txn.local_data(), Err(CoreError::NoActiveTransaction)));
        assert!(matches!(
            txn.local_data_mut(),
            Err(CoreError::NoActiveTransaction)
        ));
    }

    #[test]
    fn finishing_drops_pending_writes() {
        let mut txn = TransactionContext::new(TransactionId::new(1));
        let id = EntityId::root(ServiceId::new("Svc1"), Uuid::from_u128(1));
        txn.writes_mut().unwrap().delete(&id);
        assert_eq!(txn.write_count(), 1);

        txn.finish(TransactionState::RolledBack).unwrap();

        assert_eq!(txn.write_count(), 0);
        assert!(matches!(txn.writes_mut(), Err(CoreError::NoActiveTransaction)));
    }

    #[test]
    fn cannot_finish_twice() {
        let mut txn = TransactionContext::new(TransactionId::new(1));
        txn.finish(TransactionState::RolledBack).unwrap();
        assert!(matches!(
            txn.finish(TransactionState::Committed),
            Err(CoreError::NoActiveTransaction)
        ));
        assert_eq!(txn.state(), TransactionState::RolledBack);
    }
}
