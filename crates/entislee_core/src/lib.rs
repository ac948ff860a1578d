//! # EntiSLEE Core
//!
//! Transactional entity lifecycle management.
//!
//! This crate provides:
//! - Typed composite entity identifiers
//! - A per-transaction entity cache and write buffer that isolate concurrent
//!   transactions
//! - Root / child hierarchy linkage between entities
//! - Scoped execution-context switching for component cleanup code
//! - The [`EntityLifecycleManager`] that creates, looks up and removes entities
//!
//! ## Example
//!
//! ```rust
//! use entislee_core::{ComponentId, EntityLifecycleManager, InMemoryEntityStore, ServiceId};
//! use std::sync::Arc;
//!
//! let manager = EntityLifecycleManager::builder(Arc::new(InMemoryEntityStore::new())).build();
//! let mut txn = manager.begin().unwrap();
//!
//! let root = manager
//!     .create_root(&mut txn, &ComponentId::new("SbbA"), &ServiceId::new("Svc1"), "conv1")
//!     .unwrap();
//! assert!(root.is_root());
//!
//! let again = manager.get(&mut txn, root.id()).unwrap();
//! assert!(Arc::ptr_eq(&root, &again));
//!
//! manager.commit(&mut txn).unwrap();
//!
//! let mut txn = manager.begin().unwrap();
//! manager.remove_by_id(&mut txn, root.id(), false).unwrap();
//! assert!(manager.get(&mut txn, root.id()).is_err());
//! manager.rollback(&mut txn).unwrap();
//!
//! // Rolled back: the entity is still there.
//! let mut txn = manager.begin().unwrap();
//! assert!(manager.get(&mut txn, root.id()).is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod entity;
mod error;
mod hierarchy;
mod manager;
mod stats;
mod store;
mod transaction;
mod types;

pub use config::ManagerConfig;
pub use context::{
    ComponentContextResolver, ComponentRegistry, ContextGuard, EntityCleanup, ExecutionContext,
    ExecutionContextSwitcher,
};
pub use entity::{
    Entity, EntityId, EntityKind, IdGenerator, LifecycleState, RandomIdGenerator,
    SequentialIdGenerator,
};
pub use error::{BoxedCause, CoreError, CoreResult};
pub use hierarchy::{Linkage, ParentLink};
pub use manager::{EntityLifecycleManager, ManagerBuilder};
pub use stats::{ManagerStats, StatsSnapshot};
pub use store::{
    EntityRecord, InMemoryEntityStore, PersistentEntityStore, StoreError, StoreOp, StoreResult,
};
pub use transaction::{
    TransactionContext, TransactionManager, TransactionScopedCache, TransactionState,
};
pub use types::{ComponentId, ServiceId, TransactionId};
