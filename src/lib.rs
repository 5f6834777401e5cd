//! Rein collision detection
//!
//! Broadphase, narrowphase and ray casting for rigid bodies stored in a
//! hecs world.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **ecs** - Components read by collision detection (Transform, RigidBody, Collider, BoundingBox)
//! 2. **collision** - Shapes, broadphases, narrowphase, hooks and the [`CollisionWorld`] driver
//! 3. **task** - Worker pool used for multithreaded passes

pub mod collision;
pub mod ecs;
pub mod error;
pub mod task;

pub use error::CollisionError;

pub use collision::{
    Aabb, ArbiterKey, BroadphaseKind, BruteForce, Collision, CollisionConfig, CollisionHooks,
    CollisionSystem, CollisionWorld, CollisionWorldConfig, ConvexShape, Multishape, RaycastHit,
    Shape, SweepAndPrune,
};

pub use ecs::prelude::*;

pub use task::TaskPool;

// Re-export glam and hecs for convenience
pub use glam;
pub use hecs;
