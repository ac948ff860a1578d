//! Component context resolution.

use crate::context::switcher::ExecutionContext;
use crate::entity::Entity;
use crate::error::{BoxedCause, CoreError, CoreResult};
use crate::types::ComponentId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Component-specific cleanup run while an entity is being removed.
///
/// The hook runs with the component's own [`ExecutionContext`] installed
/// (unless removal was requested with the caller's current context), after
/// the entity's descendants have been removed and before its record is
/// deleted. Returning an error aborts the removal.
pub trait EntityCleanup: Send + Sync {
    /// Called once for each entity of the component being removed.
    fn on_remove(&self, entity: &Entity) -> Result<(), BoxedCause>;
}

impl<F> EntityCleanup for F
where
    F: Fn(&Entity) -> Result<(), BoxedCause> + Send + Sync,
{
    fn on_remove(&self, entity: &Entity) -> Result<(), BoxedCause> {
        self(entity)
    }
}

/// Resolves the execution context owned by a component.
pub trait ComponentContextResolver: Send + Sync {
    /// Returns the context for `component_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownComponent`] if the component is not known.
    fn context_for(&self, component_id: &ComponentId) -> CoreResult<ExecutionContext>;
}

/// A table of installed components and their contexts.
///
/// A strict registry (the default) only resolves registered components. A
/// permissive registry creates and remembers a bare context for any
/// component it has not seen, which suits tooling and tests.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    contexts: RwLock<HashMap<ComponentId, ExecutionContext>>,
    permissive: bool,
}

impl ComponentRegistry {
    /// Creates an empty strict registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty permissive registry.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            permissive: true,
        }
    }

    /// Installs a component context, returning the one it replaces.
    pub fn register(&self, context: ExecutionContext) -> Option<ExecutionContext> {
        self.contexts
            .write()
            .insert(context.component_id().clone(), context)
    }

    /// Uninstalls a component.
    pub fn unregister(&self, component_id: &ComponentId) -> Option<ExecutionContext> {
        self.contexts.write().remove(component_id)
    }

    /// Returns true if `component_id` has a registered context.
    #[must_use]
    pub fn contains(&self, component_id: &ComponentId) -> bool {
        self.contexts.read().contains_key(component_id)
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.read().len()
    }

    /// Returns true if no component is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.read().is_empty()
    }
}

impl ComponentContextResolver for ComponentRegistry {
    fn context_for(&self, component_id: &ComponentId) -> CoreResult<ExecutionContext> {
        if let Some(context) = self.contexts.read().get(component_id) {
            return Ok(context.clone());
        }
        if !self.permissive {
            return Err(CoreError::UnknownComponent {
                component_id: component_id.clone(),
            });
        }
        Ok(self
            .contexts
            .write()
            .entry(component_id.clone())
            .or_insert_with(|| ExecutionContext::new(component_id.clone()))
            .clone())
    }
}
