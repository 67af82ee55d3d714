use crate::geometry::Pose;
use crate::sensor::RayCaster;
use serde::{Deserialize, Serialize};

/// Opaque handle to an entity owned by the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reads the current pose of an entity. `None` when the entity no longer exists.
pub trait PoseSource {
    fn pose(&self, entity: EntityId) -> Option<Pose>;
}

/// Finds entities by their scene name.
pub trait EntityLookup {
    fn find_entity(&self, name: &str) -> Option<EntityId>;
}

/// Everything a recorder needs from the host engine on each tick.
pub trait Scene: RayCaster + PoseSource + EntityLookup {}

impl<T: RayCaster + PoseSource + EntityLookup> Scene for T {}

/// How the recorder finds the entity it tracks. Resolved once, at trial start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityBinding {
    Handle(EntityId),
    Named(String),
}

impl EntityBinding {
    pub fn named(name: impl Into<String>) -> Self {
        EntityBinding::Named(name.into())
    }

    pub fn resolve<L: EntityLookup + ?Sized>(&self, lookup: &L) -> Option<EntityId> {
        match self {
            EntityBinding::Handle(id) => Some(*id),
            EntityBinding::Named(name) => lookup.find_entity(name),
        }
    }
}

impl std::fmt::Display for EntityBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityBinding::Handle(id) => write!(f, "handle {id}"),
            EntityBinding::Named(name) => write!(f, "name '{name}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneAgent;

    impl EntityLookup for OneAgent {
        fn find_entity(&self, name: &str) -> Option<EntityId> {
            (name == "agent").then_some(EntityId(7))
        }
    }

    #[test]
    fn explicit_handle_skips_lookup() {
        assert_eq!(
            EntityBinding::Handle(EntityId(3)).resolve(&OneAgent),
            Some(EntityId(3))
        );
    }

    #[test]
    fn named_binding_uses_lookup() {
        assert_eq!(EntityBinding::named("agent").resolve(&OneAgent), Some(EntityId(7)));
        assert_eq!(EntityBinding::named("ghost").resolve(&OneAgent), None);
    }
}
