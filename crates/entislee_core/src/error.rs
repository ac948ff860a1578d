//! Error types for EntiSLEE core.

use crate::entity::EntityId;
use crate::store::StoreError;
use crate::types::ComponentId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Boxed cause carried by the opaque failure variants.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in EntiSLEE core operations.
///
/// Callers are expected to roll back the enclosing transaction on any of
/// these, since entity state may have been partially applied.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The operation requires an active transaction.
    #[error("no active transaction")]
    NoActiveTransaction,

    /// The entity is absent from both the transaction cache and the store.
    #[error("entity not found: {entity_id}")]
    EntityNotFound {
        /// The entity ID that was not found.
        entity_id: EntityId,
    },

    /// Creating a new entity failed.
    ///
    /// The display text is intentionally generic; the underlying cause is
    /// only reachable through [`std::error::Error::source`].
    #[error("entity creation failed")]
    CreationFailure {
        /// Underlying cause.
        #[source]
        source: BoxedCause,
    },

    /// Removing an entity failed.
    #[error("removal of entity {entity_id} failed")]
    RemovalFailure {
        /// The entity being removed.
        entity_id: EntityId,
        /// Underlying cause.
        #[source]
        source: BoxedCause,
    },

    /// No execution context is registered for the component.
    #[error("unknown component: {component_id}")]
    UnknownComponent {
        /// The component that could not be resolved.
        component_id: ComponentId,
    },

    /// Persistent store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an entity not found error.
    pub fn entity_not_found(entity_id: &EntityId) -> Self {
        Self::EntityNotFound {
            entity_id: entity_id.clone(),
        }
    }

    /// Wraps any failure as an opaque creation failure.
    pub fn creation_failure(source: impl Into<BoxedCause>) -> Self {
        Self::CreationFailure {
            source: source.into(),
        }
    }

    /// Wraps any failure as a removal failure of `entity_id`.
    pub fn removal_failure(entity_id: &EntityId, source: impl Into<BoxedCause>) -> Self {
        Self::RemovalFailure {
            entity_id: entity_id.clone(),
            source: source.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if this is an [`CoreError::EntityNotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. })
    }
}
