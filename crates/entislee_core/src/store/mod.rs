//! Persistent entity storage.
//!
//! The store is the only resource shared across transactions. It only ever
//! sees committed state: transactions buffer their writes and hand them to
//! [`PersistentEntityStore::apply`] as one batch on commit.

mod backend;
mod error;
mod memory;
mod op;
mod record;

pub use backend::PersistentEntityStore;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryEntityStore;
pub use op::StoreOp;
pub use record::EntityRecord;
