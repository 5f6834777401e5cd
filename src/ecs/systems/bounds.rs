//! Bounding box refresh system.

use crate::ecs::components::physics::{BoundingBox, Collider};
use crate::ecs::components::transform::Transform;

/// Recompute `BoundingBox` for every entity with a `Transform` and a
/// `Collider`, inserting the component where it is missing.
///
/// Run after the integrator moved bodies and before collision detection.
pub fn bounding_box_system(world: &mut hecs::World) {
    for (_, (transform, collider, bounds)) in
        world.query_mut::<(&Transform, &Collider, &mut BoundingBox)>()
    {
        bounds.0 = collider
            .shape
            .compute_aabb(transform.position, &transform.orientation());
    }

    // Collect first to avoid borrow conflicts with insertion.
    let missing: Vec<(hecs::Entity, BoundingBox)> = world
        .query_mut::<hecs::Without<(&Transform, &Collider), &BoundingBox>>()
        .into_iter()
        .map(|(entity, (transform, collider))| {
            let aabb = collider
                .shape
                .compute_aabb(transform.position, &transform.orientation());
            (entity, BoundingBox(aabb))
        })
        .collect();

    for (entity, bounds) in missing {
        world.insert_one(entity, bounds).ok();
    }
}
