//! Entity types and identifier generation.

mod generator;
mod id;
mod instance;

pub use generator::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use id::{EntityId, EntityKind};
pub use instance::{Entity, LifecycleState};
