//! Entity lifecycle manager.
//!
//! This is the sole place where entities are created, materialized and
//! destroyed. Every operation runs inside a caller-supplied
//! [`TransactionContext`]. Reads consult that transaction's private cache
//! and pending writes before the shared store; writes are buffered in the
//! transaction and reach the store only on commit, so uncommitted entity
//! state never leaks from one transaction into another.

use crate::config::ManagerConfig;
use crate::context::{
    ComponentContextResolver, ComponentRegistry, ExecutionContext, ExecutionContextSwitcher,
};
use crate::entity::{Entity, EntityId, IdGenerator, RandomIdGenerator};
use crate::error::{CoreError, CoreResult};
use crate::hierarchy::{self, Linkage, ParentLink};
use crate::stats::ManagerStats;
use crate::store::{PersistentEntityStore, StoreError};
use crate::transaction::{
    PendingWrite, TransactionContext, TransactionManager, TransactionScopedCache,
};
use crate::types::{ComponentId, ServiceId};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Creates, looks up and removes entities within transactions.
///
/// All collaborators are injected at construction time through
/// [`EntityLifecycleManager::builder`]; nothing is looked up from global
/// state.
///
/// ## Identity guarantees
///
/// - Within one transaction, repeated lookups of an ID return the same
///   `Arc<Entity>`.
/// - Distinct transactions never share an `Arc<Entity>`; each materializes
///   its own instance from the store.
/// - Once removed, an entity is evicted from its transaction's cache and
///   further lookups fail with [`CoreError::EntityNotFound`].
pub struct EntityLifecycleManager {
    config: ManagerConfig,
    transactions: Arc<TransactionManager>,
    store: Arc<dyn PersistentEntityStore>,
    contexts: Arc<dyn ComponentContextResolver>,
    ids: Arc<dyn IdGenerator>,
    cache: TransactionScopedCache,
    stats: ManagerStats,
}

impl EntityLifecycleManager {
    /// Starts building a manager over `store`.
    ///
    /// Unless overridden, the manager uses a fresh [`TransactionManager`],
    /// a permissive [`ComponentRegistry`] and random identifier tokens.
    #[must_use]
    pub fn builder(store: Arc<dyn PersistentEntityStore>) -> ManagerBuilder {
        ManagerBuilder::new(store)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Returns the transaction provider.
    #[must_use]
    pub fn transactions(&self) -> &Arc<TransactionManager> {
        &self.transactions
    }

    /// Returns the persistent store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn PersistentEntityStore> {
        &self.store
    }

    /// Returns the operation counters.
    #[must_use]
    pub fn stats(&self) -> &ManagerStats {
        &self.stats
    }

    // === Transactions ===

    /// Begins a new transaction.
    pub fn begin(&self) -> CoreResult<TransactionContext> {
        self.transactions.begin()
    }

    /// Commits a transaction, applying its buffered writes to the store.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoActiveTransaction`] if `txn` has ended
    /// - [`CoreError::Store`] if the store rejects the writes; `txn` is
    ///   rolled back
    pub fn commit(&self, txn: &mut TransactionContext) -> CoreResult<()> {
        self.transactions.commit(txn, self.store.as_ref())
    }

    /// Rolls back a transaction, discarding its entity cache and buffered
    /// writes. The store is left untouched.
    pub fn rollback(&self, txn: &mut TransactionContext) -> CoreResult<()> {
        self.transactions.rollback(txn)
    }

    /// Executes a function within a transaction.
    ///
    /// If the function returns `Ok`, the transaction is committed.
    /// If it returns `Err`, the transaction is rolled back.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut TransactionContext) -> CoreResult<T>,
    {
        let mut txn = self.begin()?;
        match f(&mut txn) {
            Ok(result) => {
                self.commit(&mut txn)?;
                Ok(result)
            }
            Err(e) => {
                // Keep the closure's error; a failed rollback is only logged.
                if let Err(rollback_err) = self.rollback(&mut txn) {
                    warn!(
                        txn = %txn.id(),
                        error = %rollback_err,
                        "rollback after failed transaction body failed"
                    );
                }
                Err(e)
            }
        }
    }

    // === Creation ===

    /// Creates a new root entity.
    ///
    /// The entity's ID is `{service}:root:{token}` and its root ID is its
    /// own ID. The entity is cached in `txn` and stored when `txn` commits.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoActiveTransaction`] if `txn` has ended
    /// - [`CoreError::CreationFailure`] if the entity cannot be set up
    pub fn create_root(
        &self,
        txn: &mut TransactionContext,
        component_id: &ComponentId,
        service_id: &ServiceId,
        convergence_name: &str,
    ) -> CoreResult<Arc<Entity>> {
        txn.require_active()?;

        let id = EntityId::root(service_id.clone(), self.ids.next_token());
        debug!(entity = %id, component = %component_id, txn = %txn.id(), "creating root entity");

        let entity = Entity::new(
            id,
            Linkage::Root,
            component_id.clone(),
            service_id.clone(),
            convergence_name.to_owned(),
            txn.id(),
        );
        self.install_new(txn, entity)
    }

    /// Creates a new non-root entity under `parent`.
    ///
    /// The entity's ID is `{service}:nonroot:{token}`. Its root ID is the
    /// one carried by `parent`; matching it to the parent's actual root is
    /// the caller's responsibility. The entity is cached in `txn`; it is
    /// stored, and added to the parent's relation slot when the parent
    /// exists, when `txn` commits.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoActiveTransaction`] if `txn` has ended
    /// - [`CoreError::CreationFailure`] if looking up the parent fails
    pub fn create_child(
        &self,
        txn: &mut TransactionContext,
        component_id: &ComponentId,
        service_id: &ServiceId,
        parent: &ParentLink,
        convergence_name: &str,
    ) -> CoreResult<Arc<Entity>> {
        txn.require_active()?;

        let id = EntityId::non_root(service_id.clone(), self.ids.next_token());
        debug!(
            entity = %id,
            component = %component_id,
            parent = %parent.parent_id(),
            relation = parent.relation(),
            txn = %txn.id(),
            "creating non-root entity"
        );

        let entity = Entity::new(
            id,
            Linkage::Child(parent.clone()),
            component_id.clone(),
            service_id.clone(),
            convergence_name.to_owned(),
            txn.id(),
        );
        self.install_new(txn, entity)
    }

    fn install_new(&self, txn: &mut TransactionContext, entity: Entity) -> CoreResult<Arc<Entity>> {
        let entity = Arc::new(entity);
        match self.persist_new(txn, &entity) {
            Ok(()) => {
                self.stats.record_create(entity.is_root());
                Ok(entity)
            }
            Err(err) => {
                self.stats.record_failure();
                error!(entity = %entity.id(), error = %err, "exception in creating entity");
                Err(CoreError::creation_failure(err))
            }
        }
    }

    fn persist_new(&self, txn: &mut TransactionContext, entity: &Arc<Entity>) -> CoreResult<()> {
        // The parent lookup is the only store access; a failure buffers nothing.
        if !hierarchy::attach(self.store.as_ref(), txn, entity)? {
            if let Some(parent) = entity.parent_id() {
                debug!(entity = %entity.id(), %parent, "parent not found, child slot left untouched");
            }
        }

        txn.writes_mut()?.save(entity.to_record());
        self.cache.put(txn, Arc::clone(entity))
    }

    // === Lookup ===

    /// Returns the entity with `id` as seen by `txn`.
    ///
    /// The transaction cache is consulted first, then the transaction's
    /// pending writes. On a miss the entity is re-hydrated from the store
    /// and cached, so later lookups in the same transaction return the
    /// identical instance.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoActiveTransaction`] if `txn` has ended
    /// - [`CoreError::EntityNotFound`] if `id` is pending deletion in `txn`,
    ///   or neither the cache nor the store knows it
    pub fn get(&self, txn: &mut TransactionContext, id: &EntityId) -> CoreResult<Arc<Entity>> {
        txn.require_active()?;

        match self.cache.get(txn, id) {
            Ok(Some(entity)) => {
                trace!(entity = %id, txn = %txn.id(), "found entity in transaction cache");
                self.stats.record_cache_hit();
                return Ok(entity);
            }
            Ok(None) => {}
            Err(err) => {
                debug!(entity = %id, error = %err, "transaction cache lookup failed, loading from store");
            }
        }

        let record = match txn.writes().get(id) {
            Some(PendingWrite::Delete) => None,
            Some(PendingWrite::Save(record)) => Some(record.clone()),
            None => self.store.load(id)?,
        };
        let Some(record) = record else {
            self.stats.record_not_found();
            return Err(CoreError::entity_not_found(id));
        };
        if record.id != *id {
            return Err(StoreError::corrupted(format!(
                "record for {id} is keyed as {}",
                record.id
            ))
            .into());
        }

        debug!(entity = %id, txn = %txn.id(), "loading entity from store");
        let entity = Arc::new(Entity::from_record(record, txn.id()));
        self.cache.put(txn, Arc::clone(&entity))?;
        self.stats.record_load();
        Ok(entity)
    }

    /// Like [`get`](Self::get), but maps [`CoreError::EntityNotFound`] to `None`.
    pub fn find(
        &self,
        txn: &mut TransactionContext,
        id: &EntityId,
    ) -> CoreResult<Option<Arc<Entity>>> {
        match self.get(txn, id) {
            Ok(entity) => Ok(Some(entity)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Returns all children of `parent_id` visible to `txn`, ordered by ID.
    ///
    /// Children are found by querying persisted entities by parent ID,
    /// adding those created in `txn` and dropping those it removed. They
    /// are materialized through [`get`](Self::get).
    pub fn children(
        &self,
        txn: &mut TransactionContext,
        parent_id: &EntityId,
    ) -> CoreResult<Vec<Arc<Entity>>> {
        self.children_matching(txn, parent_id, None)
    }

    /// Returns the children of `parent_id` in slot `relation` visible to `txn`.
    pub fn children_in(
        &self,
        txn: &mut TransactionContext,
        parent_id: &EntityId,
        relation: &str,
    ) -> CoreResult<Vec<Arc<Entity>>> {
        self.children_matching(txn, parent_id, Some(relation))
    }

    fn children_matching(
        &self,
        txn: &mut TransactionContext,
        parent_id: &EntityId,
        relation: Option<&str>,
    ) -> CoreResult<Vec<Arc<Entity>>> {
        txn.require_active()?;
        hierarchy::children(self.store.as_ref(), txn, parent_id, relation)?
            .iter()
            .map(|id| self.get(txn, id))
            .collect()
    }

    // === Removal ===

    /// Removes `entity`, running its component's cleanup under the
    /// component's own execution context.
    ///
    /// The protocol is: remove descendants (if cascading), run the
    /// component cleanup hook, buffer deletion of the record and, if
    /// `remove_from_parent`, detachment from the parent's relation slot,
    /// mark the instance removed and evict it from the transaction cache.
    /// The store changes when `txn` commits; rolling back restores the
    /// entity. The caller's execution context is restored on every exit
    /// path.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoActiveTransaction`] if `txn` has ended
    /// - [`CoreError::EntityNotFound`] if `entity` was already removed
    /// - [`CoreError::RemovalFailure`] if cleanup or a store lookup fails
    pub fn remove(
        &self,
        txn: &mut TransactionContext,
        entity: &Entity,
        remove_from_parent: bool,
    ) -> CoreResult<()> {
        txn.require_active()?;
        self.remove_at_depth(
            txn,
            entity,
            remove_from_parent,
            0,
            self.config.switch_context_on_remove,
        )
    }

    /// Resolves `id` through [`get`](Self::get) and removes it.
    pub fn remove_by_id(
        &self,
        txn: &mut TransactionContext,
        id: &EntityId,
        remove_from_parent: bool,
    ) -> CoreResult<()> {
        let entity = self.get(txn, id)?;
        self.remove(txn, &entity, remove_from_parent)
    }

    /// Removes `entity` without switching execution contexts.
    ///
    /// For callers already running under the entity's component context.
    /// Descendants removed by cascade still get their own contexts if
    /// [`ManagerConfig::switch_context_on_remove`] is set.
    pub fn remove_with_current_context(
        &self,
        txn: &mut TransactionContext,
        entity: &Entity,
        remove_from_parent: bool,
    ) -> CoreResult<()> {
        txn.require_active()?;
        self.remove_at_depth(txn, entity, remove_from_parent, 0, false)
    }

    fn remove_at_depth(
        &self,
        txn: &mut TransactionContext,
        entity: &Entity,
        remove_from_parent: bool,
        depth: usize,
        switch_context: bool,
    ) -> CoreResult<()> {
        if entity.is_removed() {
            return Err(CoreError::entity_not_found(entity.id()));
        }
        if entity.transaction_id() != txn.id() {
            return Err(CoreError::invalid_operation(format!(
                "entity {} belongs to {}, not {}",
                entity.id(),
                entity.transaction_id(),
                txn.id()
            )));
        }

        let result = self
            .contexts
            .context_for(entity.component_id())
            .and_then(|context| {
                if switch_context {
                    ExecutionContextSwitcher::run(context.clone(), || {
                        self.remove_in_context(txn, entity, &context, remove_from_parent, depth)
                    })
                } else {
                    self.remove_in_context(txn, entity, &context, remove_from_parent, depth)
                }
            });

        result.map_err(|err| {
            let err = match err {
                CoreError::NoActiveTransaction | CoreError::RemovalFailure { .. } => err,
                other => CoreError::removal_failure(entity.id(), other),
            };
            if depth == 0 {
                self.stats.record_failure();
                warn!(entity = %entity.id(), error = %err, "entity removal failed");
            }
            err
        })
    }

    fn remove_in_context(
        &self,
        txn: &mut TransactionContext,
        entity: &Entity,
        context: &ExecutionContext,
        remove_from_parent: bool,
        depth: usize,
    ) -> CoreResult<()> {
        if self.config.cascade_removal {
            self.remove_descendants(txn, entity, depth)?;
        }

        if let Some(cleanup) = context.cleanup() {
            cleanup
                .on_remove(entity)
                .map_err(|source| CoreError::removal_failure(entity.id(), source))?;
        }

        // The slot lookup may hit the store; run it before buffering anything.
        if remove_from_parent && !hierarchy::detach(self.store.as_ref(), txn, entity)? {
            if let Some(parent) = entity.parent_id() {
                warn!(
                    entity = %entity.id(),
                    %parent,
                    relation = entity.parent_relation().unwrap_or_default(),
                    "entity was not attached to its parent slot"
                );
            }
        }
        txn.writes_mut()?.delete(entity.id());

        entity.mark_removed();
        self.cache.remove(txn, entity.id())?;
        self.stats.record_removal(depth > 0);
        debug!(entity = %entity.id(), depth, remove_from_parent, txn = %txn.id(), "removed entity");
        Ok(())
    }

    fn remove_descendants(
        &self,
        txn: &mut TransactionContext,
        entity: &Entity,
        depth: usize,
    ) -> CoreResult<()> {
        let children = hierarchy::children(self.store.as_ref(), txn, entity.id(), None)?;
        if children.is_empty() {
            return Ok(());
        }
        if depth >= self.config.max_cascade_depth {
            return Err(CoreError::invalid_operation(format!(
                "cascading removal deeper than {} levels",
                self.config.max_cascade_depth
            )));
        }

        for child_id in &children {
            let child = self.get(txn, child_id)?;
            self.remove_at_depth(
                txn,
                &child,
                false,
                depth + 1,
                self.config.switch_context_on_remove,
            )?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EntityLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityLifecycleManager")
            .field("config", &self.config)
            .field("transactions", &self.transactions)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

/// Assembles an [`EntityLifecycleManager`] from its collaborators.
pub struct ManagerBuilder {
    store: Arc<dyn PersistentEntityStore>,
    transactions: Option<Arc<TransactionManager>>,
    contexts: Option<Arc<dyn ComponentContextResolver>>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: ManagerConfig,
}

impl ManagerBuilder {
    fn new(store: Arc<dyn PersistentEntityStore>) -> Self {
        Self {
            store,
            transactions: None,
            contexts: None,
            ids: None,
            config: ManagerConfig::default(),
        }
    }

    /// Uses a shared transaction provider.
    #[must_use]
    pub fn transactions(mut self, transactions: Arc<TransactionManager>) -> Self {
        self.transactions = Some(transactions);
        self
    }

    /// Uses `resolver` to find component execution contexts.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ComponentContextResolver>) -> Self {
        self.contexts = Some(resolver);
        self
    }

    /// Uses `ids` to generate identifier tokens.
    #[must_use]
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Sets the manager configuration.
    #[must_use]
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the manager.
    #[must_use]
    pub fn build(self) -> EntityLifecycleManager {
        EntityLifecycleManager {
            config: self.config,
            transactions: self.transactions.unwrap_or_default(),
            store: self.store,
            contexts: self
                .contexts
                .unwrap_or_else(|| Arc::new(ComponentRegistry::permissive())),
            ids: self.ids.unwrap_or_else(|| Arc::new(RandomIdGenerator)),
            cache: TransactionScopedCache,
            stats: ManagerStats::new(),
        }
    }
}
