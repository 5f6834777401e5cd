//! Collision-related components for ECS entities.

use crate::collision::aabb::Aabb;
use crate::collision::shape::Shape;

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidBodyType {
    /// Affected by forces and collisions.
    Dynamic,
    /// Immovable.
    Static,
    /// Position controlled by user, but affects dynamic bodies.
    Kinematic,
}

/// Body state the collision systems read. Integration data lives with the
/// dynamics code that owns the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RigidBody {
    pub body_type: RigidBodyType,
    /// Inactive (sleeping) bodies only collide with active ones.
    pub is_active: bool,
}

impl RigidBody {
    /// Create a new dynamic rigid body.
    pub fn new_dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            is_active: true,
        }
    }

    /// Create a new static rigid body.
    pub fn new_static() -> Self {
        Self {
            body_type: RigidBodyType::Static,
            is_active: true,
        }
    }

    /// Create a new kinematic rigid body.
    pub fn new_kinematic() -> Self {
        Self {
            body_type: RigidBodyType::Kinematic,
            is_active: true,
        }
    }

    pub fn is_static(&self) -> bool {
        self.body_type == RigidBodyType::Static
    }

    pub fn is_static_or_inactive(&self) -> bool {
        self.is_static() || !self.is_active
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new_dynamic()
    }
}

/// Collision detection component.
#[derive(Debug, Clone)]
pub struct Collider {
    pub shape: Shape,
}

impl Collider {
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
        }
    }
}

/// World-space bounds of the collider, kept current by
/// [`bounding_box_system`](crate::ecs::systems::bounding_box_system).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox(pub Aabb);
