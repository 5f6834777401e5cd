//! Hooks fired by the detection pipeline.
//!
//! The pipeline runs broadphase-passed, then narrowphase-passed, then
//! collision-detected for every candidate pair. Each hook holds at most one
//! subscriber; installing a new one replaces the previous. Hooks may be
//! invoked from worker threads, hence the `Send + Sync` bounds.

use glam::Vec3;
use hecs::Entity;

use super::contact::Collision;

/// Veto a pair after the AABB test. Return `false` to skip it.
pub type BroadphaseFilter = dyn Fn(Entity, Entity) -> bool + Send + Sync;

/// Veto or adjust a contact after the narrowphase. Receives the contact
/// point and normal mutably and the penetration depth.
pub type NarrowphaseFilter =
    dyn Fn(Entity, Entity, &mut Vec3, &mut Vec3, f32) -> bool + Send + Sync;

/// Receives every accepted collision.
pub type CollisionListener = dyn Fn(&Collision) + Send + Sync;

/// Per-body filter for scene ray casts: `(entity, normal, fraction)`.
pub type RaycastFilter = dyn Fn(Entity, Vec3, f32) -> bool;

#[derive(Default)]
pub struct CollisionHooks {
    passed_broadphase: Option<Box<BroadphaseFilter>>,
    passed_narrowphase: Option<Box<NarrowphaseFilter>>,
    collision_detected: Option<Box<CollisionListener>>,
}

impl CollisionHooks {
    pub fn on_passed_broadphase(
        &mut self,
        hook: impl Fn(Entity, Entity) -> bool + Send + Sync + 'static,
    ) {
        self.passed_broadphase = Some(Box::new(hook));
    }

    pub fn on_passed_narrowphase(
        &mut self,
        hook: impl Fn(Entity, Entity, &mut Vec3, &mut Vec3, f32) -> bool + Send + Sync + 'static,
    ) {
        self.passed_narrowphase = Some(Box::new(hook));
    }

    pub fn on_collision_detected(&mut self, hook: impl Fn(&Collision) + Send + Sync + 'static) {
        self.collision_detected = Some(Box::new(hook));
    }

    /// Remove every subscriber.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `true` when no filter is installed.
    pub fn raise_passed_broadphase(&self, body1: Entity, body2: Entity) -> bool {
        self.passed_broadphase
            .as_ref()
            .map_or(true, |hook| hook(body1, body2))
    }

    pub fn raise_passed_narrowphase(
        &self,
        body1: Entity,
        body2: Entity,
        point: &mut Vec3,
        normal: &mut Vec3,
        penetration: f32,
    ) -> bool {
        self.passed_narrowphase
            .as_ref()
            .map_or(true, |hook| hook(body1, body2, point, normal, penetration))
    }

    pub fn raise_collision_detected(&self, collision: &Collision) {
        if let Some(hook) = &self.collision_detected {
            hook(collision);
        }
    }
}

impl std::fmt::Debug for CollisionHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionHooks")
            .field("passed_broadphase", &self.passed_broadphase.is_some())
            .field("passed_narrowphase", &self.passed_narrowphase.is_some())
            .field("collision_detected", &self.collision_detected.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_hooks_accept() {
        let hooks = CollisionHooks::default();
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        assert!(hooks.raise_passed_broadphase(a, b));
        let (mut p, mut n) = (Vec3::ZERO, Vec3::Y);
        assert!(hooks.raise_passed_narrowphase(a, b, &mut p, &mut n, 0.1));
    }

    #[test]
    fn test_narrowphase_hook_can_rewrite_contact() {
        let mut hooks = CollisionHooks::default();
        hooks.on_passed_narrowphase(|_, _, point, normal, _| {
            *point = Vec3::ONE;
            *normal = Vec3::X;
            true
        });
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let (mut p, mut n) = (Vec3::ZERO, Vec3::Y);
        assert!(hooks.raise_passed_narrowphase(a, b, &mut p, &mut n, 0.1));
        assert_eq!(p, Vec3::ONE);
        assert_eq!(n, Vec3::X);
    }

    #[test]
    fn test_setting_hook_replaces_previous() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut hooks = CollisionHooks::default();
        let counter = first.clone();
        hooks.on_collision_detected(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let counter = second.clone();
        hooks.on_collision_detected(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let mut world = hecs::World::new();
        let collision = Collision {
            body1: world.spawn(()),
            body2: world.spawn(()),
            point1: Vec3::ZERO,
            point2: Vec3::ZERO,
            normal: Vec3::Y,
            penetration: 0.0,
        };
        hooks.raise_collision_detected(&collision);
        assert_eq!(first.load(Ordering::Relaxed), 0);
        assert_eq!(second.load(Ordering::Relaxed), 1);

        hooks.clear();
        hooks.raise_collision_detected(&collision);
        assert_eq!(second.load(Ordering::Relaxed), 1);
    }
}
