//! Entity identifier.

use crate::types::ServiceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Position of an entity in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// The entity anchors its own tree.
    Root,
    /// The entity is attached to a parent.
    NonRoot,
}

impl EntityKind {
    /// Returns the tag used in the display form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::NonRoot => "nonroot",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for an entity.
///
/// Entity IDs are composite keys of the owning service, the kind tag and a
/// random token. They are:
/// - Globally unique for the lifetime of the entity
/// - Immutable once assigned
/// - Compared structurally, never by parsing their display form
///
/// The display form `{service}:{root|nonroot}:{token}` exists for logs only.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    service: ServiceId,
    kind: EntityKind,
    token: Uuid,
}

impl EntityId {
    /// Creates an entity ID from its parts.
    #[must_use]
    pub fn new(service: ServiceId, kind: EntityKind, token: Uuid) -> Self {
        Self {
            service,
            kind,
            token,
        }
    }

    /// Creates a root entity ID.
    #[must_use]
    pub fn root(service: ServiceId, token: Uuid) -> Self {
        Self::new(service, EntityKind::Root, token)
    }

    /// Creates a non-root entity ID.
    #[must_use]
    pub fn non_root(service: ServiceId, token: Uuid) -> Self {
        Self::new(service, EntityKind::NonRoot, token)
    }

    /// Returns the owning service.
    #[must_use]
    pub fn service(&self) -> &ServiceId {
        &self.service
    }

    /// Returns the kind tag.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the random token.
    #[must_use]
    pub fn token(&self) -> Uuid {
        self.token
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({self})")
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.service, self.kind, self.token)
    }
}
