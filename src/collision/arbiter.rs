//! Unordered body-pair identity.

use hecs::Entity;

/// Identifies a pair of bodies regardless of order: `ArbiterKey::new(a, b)`
/// equals and hashes like `ArbiterKey::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArbiterKey {
    body1: Entity,
    body2: Entity,
}

impl ArbiterKey {
    pub fn new(a: Entity, b: Entity) -> Self {
        if a.to_bits() <= b.to_bits() {
            Self { body1: a, body2: b }
        } else {
            Self { body1: b, body2: a }
        }
    }

    pub fn body1(&self) -> Entity {
        self.body1
    }

    pub fn body2(&self) -> Entity {
        self.body2
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.body1 == entity || self.body2 == entity
    }
}
