//! Contact and ray-hit records produced by collision detection.

use glam::Vec3;
use hecs::Entity;

/// Raw narrowphase result between two convex shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    /// Contact point in world space.
    pub point: Vec3,
    /// Unit contact normal pointing from shape B toward shape A.
    pub normal: Vec3,
    /// Penetration depth, positive when the shapes overlap.
    pub penetration: f32,
}

/// A detected collision between two bodies, handed to the solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub body1: Entity,
    pub body2: Entity,
    /// Support point on body 1 in world space.
    pub point1: Vec3,
    /// Support point on body 2 in world space.
    pub point2: Vec3,
    /// Points from body 2 toward body 1.
    pub normal: Vec3,
    pub penetration: f32,
}

/// Closest ray hit in a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub entity: Entity,
    /// Outward surface normal at the hit.
    pub normal: Vec3,
    /// Hit point is `origin + fraction * direction`.
    pub fraction: f32,
}

/// Ray hit against a single body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyRayHit {
    pub normal: Vec3,
    pub fraction: f32,
}
