//! Collision detection: broadphases, narrowphase, multishapes and ray casts.
//!
//! # Architecture
//!
//! A collision system owns a list of registered body entities; the bodies
//! themselves live in the caller's `hecs::World`. Each `detect` pass:
//!
//! 1. Snapshot registered bodies ([`CollisionBody`])
//! 2. Broadphase: brute-force scan or persistent sweep-and-prune
//! 3. Static/inactive rejection, then the broadphase hook
//! 4. Narrowphase (Minkowski portal refinement, multishape iteration)
//! 5. Narrowphase hook, then the collision-detected hook
//!
//! Pairs are processed inline or on the [`TaskPool`](crate::task::TaskPool)
//! followed by a barrier.

pub mod aabb;
pub mod arbiter;
pub mod bit_matrix;
pub mod body;
pub mod brute_force;
pub mod compound;
pub mod contact;
pub mod dispatcher;
pub mod events;
pub mod gjk;
pub mod multishape;
pub mod narrowphase;
pub mod shape;
pub mod sweep_and_prune;
pub mod terrain;
pub mod triangle;
pub mod trimesh;
pub mod world;

use glam::Vec3;
use hecs::Entity;

use crate::CollisionError;

pub use self::aabb::Aabb;
pub use self::arbiter::ArbiterKey;
pub use self::body::CollisionBody;
pub use self::brute_force::BruteForce;
pub use self::contact::{BodyRayHit, Collision, ContactInfo, RaycastHit};
pub use self::dispatcher::CollisionDispatcher;
pub use self::events::{CollisionHooks, RaycastFilter};
pub use self::multishape::{Multishape, MultishapeKind, WorkingClone};
pub use self::shape::{ConvexShape, Shape, SupportMap};
pub use self::sweep_and_prune::SweepAndPrune;
pub use self::world::{BroadphaseKind, CollisionWorld, CollisionWorldConfig};

/// Configuration shared by all collision systems.
#[derive(Debug, Clone)]
pub struct CollisionConfig {
    /// Replace the narrowphase normal of terrain contacts with the triangle
    /// face normal. Default: true.
    pub use_terrain_normal: bool,
    /// Same for triangle meshes. Default: true.
    pub use_triangle_mesh_normal: bool,
    /// Sweep-and-prune rebuilds from scratch when more bodies than this were
    /// added since the last pass. Default: 250.
    pub full_rebuild_threshold: usize,
    /// Sweep-and-prune grows and shrinks its pair matrix in steps of this
    /// many bodies. Default: 500.
    pub matrix_grow_factor: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            use_terrain_normal: true,
            use_triangle_mesh_normal: true,
            full_rebuild_threshold: 250,
            matrix_grow_factor: 500,
        }
    }
}

/// Snapshot every entity in `entities`.
pub(crate) fn capture_bodies(
    world: &hecs::World,
    entities: &[Entity],
    out: &mut Vec<CollisionBody>,
) -> Result<(), CollisionError> {
    out.clear();
    for &entity in entities {
        out.push(CollisionBody::capture(world, entity)?);
    }
    Ok(())
}

/// Contract between the world driver and a broadphase.
pub trait CollisionSystem: Send {
    /// Register a body entity.
    fn add_body(&mut self, entity: Entity) -> Result<(), CollisionError>;

    /// Unregister a body. Returns `false` when it was not registered.
    fn remove_body(&mut self, entity: Entity) -> bool;

    /// Run one detection pass over all registered bodies, firing the hooks
    /// for every collision found.
    fn detect(&mut self, world: &hecs::World, multithreaded: bool) -> Result<(), CollisionError>;

    /// Registered entities, in internal order.
    fn bodies(&self) -> &[Entity];

    /// Narrowphase dispatcher shared by every pair this system accepts.
    fn dispatcher(&self) -> &CollisionDispatcher;

    /// Mutable access to the dispatcher's config and hooks.
    fn dispatcher_mut(&mut self) -> &mut CollisionDispatcher;

    fn body_count(&self) -> usize {
        self.bodies().len()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.bodies().contains(&entity)
    }

    fn config(&self) -> &CollisionConfig {
        &self.dispatcher().config
    }

    fn config_mut(&mut self) -> &mut CollisionConfig {
        &mut self.dispatcher_mut().config
    }

    fn hooks_mut(&mut self) -> &mut CollisionHooks {
        &mut self.dispatcher_mut().hooks
    }

    /// Closest body hit by the ray `origin + t * direction` that passes
    /// `filter`. Terrain, mesh and compound bodies are only searched along
    /// the segment `origin .. origin + direction`.
    fn raycast(
        &self,
        world: &hecs::World,
        origin: Vec3,
        direction: Vec3,
        filter: Option<&RaycastFilter>,
    ) -> Result<Option<RaycastHit>, CollisionError> {
        let mut bodies = Vec::with_capacity(self.body_count());
        capture_bodies(world, self.bodies(), &mut bodies)?;
        Ok(self
            .dispatcher()
            .raycast_scene(&bodies, origin, direction, filter))
    }

    /// Ray cast against a single body, registered or not.
    fn raycast_body(
        &self,
        world: &hecs::World,
        entity: Entity,
        origin: Vec3,
        direction: Vec3,
    ) -> Result<Option<BodyRayHit>, CollisionError> {
        let body = CollisionBody::capture(world, entity)?;
        Ok(self.dispatcher().raycast_body(&body, origin, direction))
    }
}
