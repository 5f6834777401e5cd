//! Per-pass snapshot of a registered body.

use glam::{Mat3, Vec3};
use hecs::Entity;

use super::aabb::Aabb;
use super::shape::{support_transformed, Shape, SupportMap};
use crate::ecs::components::physics::{BoundingBox, Collider, RigidBody};
use crate::ecs::components::transform::Transform;
use crate::CollisionError;

/// Read-only copy of everything detection needs from one body.
///
/// Captured from the world at the start of a `detect` or `raycast` call so
/// worker tasks never hold component borrows. Shape geometry is shared
/// through `Arc`, so capturing is cheap.
#[derive(Debug, Clone)]
pub struct CollisionBody {
    pub entity: Entity,
    pub shape: Shape,
    pub position: Vec3,
    pub orientation: Mat3,
    pub inv_orientation: Mat3,
    pub bounding_box: Aabb,
    pub is_static: bool,
    pub is_active: bool,
}

impl CollisionBody {
    /// Snapshot `entity`. Bodies without a `BoundingBox` get one computed
    /// from the current transform.
    pub fn capture(world: &hecs::World, entity: Entity) -> Result<Self, CollisionError> {
        let unavailable = |source| CollisionError::BodyUnavailable { entity, source };

        let transform = *world.get::<&Transform>(entity).map_err(unavailable)?;
        let body = *world.get::<&RigidBody>(entity).map_err(unavailable)?;
        let shape = world
            .get::<&Collider>(entity)
            .map_err(unavailable)?
            .shape
            .clone();

        let orientation = transform.orientation();
        let bounding_box = match world.get::<&BoundingBox>(entity) {
            Ok(bounds) => bounds.0,
            Err(_) => shape.compute_aabb(transform.position, &orientation),
        };

        Ok(Self {
            entity,
            shape,
            position: transform.position,
            orientation,
            inv_orientation: orientation.transpose(),
            bounding_box,
            is_static: body.is_static(),
            is_active: body.is_active,
        })
    }

    pub fn is_static_or_inactive(&self) -> bool {
        self.is_static || !self.is_active
    }

    /// A world-space box expressed in this body's local frame.
    pub fn to_local_aabb(&self, world_box: &Aabb) -> Aabb {
        world_box.inverse_transformed(self.position, &self.orientation)
    }

    /// World point into this body's local frame.
    pub fn to_local_point(&self, point: Vec3) -> Vec3 {
        self.inv_orientation * (point - self.position)
    }

    /// World direction into this body's local frame.
    pub fn to_local_direction(&self, direction: Vec3) -> Vec3 {
        self.inv_orientation * direction
    }

    /// World-space support of `shape` placed at this body's transform.
    pub fn support<S: SupportMap + ?Sized>(&self, shape: &S, direction: Vec3) -> Vec3 {
        support_transformed(shape, &self.orientation, self.position, direction)
    }
}
