//! Transaction manager.

use crate::error::CoreResult;
use crate::store::PersistentEntityStore;
use crate::transaction::{TransactionContext, TransactionState};
use crate::types::TransactionId;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

/// Hands out transaction contexts and tracks which are active.
///
/// Committing hands the transaction's buffered writes to the store as one
/// batch; rolling back drops them. How atomic the batch is depends on the
/// store's [`PersistentEntityStore::apply`].
#[derive(Debug)]
pub struct TransactionManager {
    /// Next transaction ID.
    next_txid: AtomicU64,
    /// Active transactions.
    active_txns: RwLock<Vec<TransactionId>>,
}

impl TransactionManager {
    /// Creates a new transaction manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_txid: AtomicU64::new(1),
            active_txns: RwLock::new(Vec::new()),
        }
    }

    /// Begins a new transaction.
    pub fn begin(&self) -> CoreResult<TransactionContext> {
        let txid = TransactionId::new(self.next_txid.fetch_add(1, Ordering::SeqCst));
        self.active_txns.write().push(txid);
        debug!(%txid, "transaction started");
        Ok(TransactionContext::new(txid))
    }

    /// Commits a transaction: applies its pending writes to `store`, then
    /// discards its entity cache.
    ///
    /// If the store rejects the writes, the transaction is rolled back and
    /// the store error is returned.
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        store: &dyn PersistentEntityStore,
    ) -> CoreResult<()> {
        txn.require_active()?;

        if !txn.writes().is_empty() {
            let ops = txn.writes().to_ops();
            if let Err(err) = store.apply(&ops) {
                error!(
                    txid = %txn.id(),
                    writes = ops.len(),
                    error = %err,
                    "commit failed, rolling back"
                );
                self.finish(txn, TransactionState::RolledBack)?;
                return Err(err.into());
            }
        }
        self.finish(txn, TransactionState::Committed)
    }

    /// Rolls back a transaction, discarding its entity cache and pending writes.
    pub fn rollback(&self, txn: &mut TransactionContext) -> CoreResult<()> {
        self.finish(txn, TransactionState::RolledBack)
    }

    fn finish(&self, txn: &mut TransactionContext, state: TransactionState) -> CoreResult<()> {
        let cached = txn.cached_count();
        let writes = txn.write_count();
        txn.finish(state)?;

        let txid = txn.id();
        self.active_txns.write().retain(|&id| id != txid);
        debug!(%txid, ?state, cached, writes, "transaction finished");
        Ok(())
    }

    /// Returns the number of active transactions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_txns.read().len()
    }

    /// Returns true if `txid` is still active.
    #[must_use]
    pub fn is_active(&self, txid: TransactionId) -> bool {
        self.active_txns.read().contains(&txid)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
