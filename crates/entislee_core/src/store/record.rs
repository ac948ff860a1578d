//! Persisted entity form.

use crate::entity::EntityId;
use crate::hierarchy::Linkage;
use crate::types::{ComponentId, ServiceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The persisted state of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity ID (the store key).
    pub id: EntityId,
    /// Position in the entity tree.
    pub linkage: Linkage,
    /// Component the entity instantiates.
    pub component_id: ComponentId,
    /// Owning service.
    pub service_id: ServiceId,
    /// Application-level grouping key.
    pub convergence_name: String,
    /// Child slots: relation name -> attached child IDs.
    #[serde(default)]
    pub child_relations: BTreeMap<String, BTreeSet<EntityId>>,
}

impl EntityRecord {
    /// Returns the children attached under `relation`.
    pub fn children_in(&self, relation: &str) -> impl Iterator<Item = &EntityId> {
        self.child_relations
            .get(relation)
            .into_iter()
            .flat_map(|slot| slot.iter())
    }
}
