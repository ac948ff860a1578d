//! Transaction contexts and the transaction-scoped entity cache.
//!
//! Isolation between concurrent transactions rests on two rules. Every
//! transaction owns a private map from entity ID to entity instance, so two
//! transactions touching the same logical entity each materialize their own
//! instance. And every write is buffered in the transaction until commit,
//! so the shared store only ever holds committed state. Both are discarded
//! when the transaction ends. No locks are taken on entities themselves.

mod cache;
mod context;
mod manager;
mod writes;

pub use cache::TransactionScopedCache;
pub use context::{TransactionContext, TransactionState};
pub use manager::TransactionManager;
pub(crate) use writes::PendingWrite;
