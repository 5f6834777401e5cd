//! Helpers for spawning collision bodies into a hecs world.

use crate::collision::shape::Shape;
use crate::ecs::components::physics::{BoundingBox, Collider, RigidBody};
use crate::ecs::components::transform::Transform;

/// Spawn an entity carrying everything the collision systems read.
///
/// Creates an entity with Transform, RigidBody, Collider and an up to date
/// BoundingBox.
pub fn spawn_body(
    world: &mut hecs::World,
    transform: Transform,
    body: RigidBody,
    shape: impl Into<Shape>,
) -> hecs::Entity {
    let shape = shape.into();
    let bounds = BoundingBox(shape.compute_aabb(transform.position, &transform.orientation()));
    world.spawn((transform, body, Collider { shape }, bounds))
}
