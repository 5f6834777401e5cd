//! Brute-force broadphase: every pair of registered bodies is tested.

use std::sync::Arc;

use hecs::Entity;

use super::body::CollisionBody;
use super::dispatcher::CollisionDispatcher;
use super::{capture_bodies, CollisionConfig, CollisionSystem};
use crate::task::TaskPool;
use crate::CollisionError;

/// O(n^2) broadphase. Reference implementation for the sweep-and-prune
/// structure and a good fit for small body counts.
pub struct BruteForce {
    dispatcher: CollisionDispatcher,
    pool: Arc<TaskPool>,
    bodies: Vec<Entity>,
    swap_order: bool,
    /// Accepted pairs (snapshot indices), reused across passes.
    pairs: Vec<(usize, usize)>,
    snapshot: Vec<CollisionBody>,
}

impl BruteForce {
    pub fn new(config: CollisionConfig, pool: Arc<TaskPool>) -> Self {
        Self {
            dispatcher: CollisionDispatcher::new(config),
            pool,
            bodies: Vec::new(),
            swap_order: false,
            pairs: Vec::new(),
            snapshot: Vec::new(),
        }
    }
}

impl CollisionSystem for BruteForce {
    fn add_body(&mut self, entity: Entity) -> Result<(), CollisionError> {
        if self.bodies.contains(&entity) {
            return Err(CollisionError::AlreadyRegistered(entity));
        }
        self.bodies.push(entity);
        tracing::debug!(?entity, bodies = self.bodies.len(), "body added to brute-force broadphase");
        Ok(())
    }

    fn remove_body(&mut self, entity: Entity) -> bool {
        match self.bodies.iter().position(|e| *e == entity) {
            Some(index) => {
                self.bodies.remove(index);
                tracing::debug!(?entity, "body removed from brute-force broadphase");
                true
            }
            None => false,
        }
    }

    fn detect(&mut self, world: &hecs::World, multithreaded: bool) -> Result<(), CollisionError> {
        capture_bodies(world, &self.bodies, &mut self.snapshot)?;
        let snapshot = &self.snapshot;
        let dispatcher = &self.dispatcher;

        self.pairs.clear();
        let mut accepted = 0usize;
        for i in 0..snapshot.len() {
            for j in (i + 1)..snapshot.len() {
                let (a, b) = (&snapshot[i], &snapshot[j]);
                if CollisionDispatcher::check_both_static_or_inactive(a, b)
                    || !CollisionDispatcher::check_bounding_boxes(a, b)
                {
                    continue;
                }
                if !dispatcher.hooks.raise_passed_broadphase(a.entity, b.entity) {
                    continue;
                }

                let (first, second) = if self.swap_order { (i, j) } else { (j, i) };
                self.swap_order = !self.swap_order;
                accepted += 1;

                if multithreaded {
                    self.pairs.push((first, second));
                } else {
                    dispatcher.detect(&snapshot[first], &snapshot[second]);
                }
            }
        }

        if multithreaded {
            self.pool.for_each(&self.pairs, |&(first, second)| {
                dispatcher.detect(&snapshot[first], &snapshot[second]);
            });
        }

        tracing::trace!(bodies = snapshot.len(), pairs = accepted, multithreaded, "brute-force pass");
        Ok(())
    }

    fn bodies(&self) -> &[Entity] {
        &self.bodies
    }

    fn dispatcher(&self) -> &CollisionDispatcher {
        &self.dispatcher
    }

    fn dispatcher_mut(&mut self) -> &mut CollisionDispatcher {
        &mut self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::contact::Collision;
    use crate::collision::shape::Shape;
    use crate::ecs::bridge::spawn_body;
    use crate::ecs::components::physics::RigidBody;
    use crate::ecs::components::transform::Transform;
    use glam::Vec3;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn broadphase() -> BruteForce {
        BruteForce::new(CollisionConfig::default(), Arc::new(TaskPool::new(2).unwrap()))
    }

    fn sphere_at(world: &mut hecs::World, x: f32, body: RigidBody) -> Entity {
        spawn_body(world, Transform::from_position(Vec3::new(x, 0.0, 0.0)), body, Shape::sphere(1.0))
    }

    fn record(system: &mut BruteForce) -> Arc<Mutex<Vec<Collision>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        system
            .hooks_mut()
            .on_collision_detected(move |c| sink.lock().unwrap().push(*c));
        log
    }

    #[test]
    fn test_duplicate_add_is_an_error() {
        let mut world = hecs::World::new();
        let a = sphere_at(&mut world, 0.0, RigidBody::new_dynamic());
        let mut system = broadphase();
        system.add_body(a).unwrap();
        assert!(matches!(
            system.add_body(a),
            Err(CollisionError::AlreadyRegistered(e)) if e == a
        ));
        assert_eq!(system.body_count(), 1);
    }

    #[test]
    fn test_remove_unknown_body() {
        let mut world = hecs::World::new();
        let a = sphere_at(&mut world, 0.0, RigidBody::new_dynamic());
        let b = sphere_at(&mut world, 5.0, RigidBody::new_dynamic());
        let mut system = broadphase();
        system.add_body(a).unwrap();
        assert!(!system.remove_body(b));
        assert!(system.remove_body(a));
        assert!(!system.remove_body(a));
        assert_eq!(system.body_count(), 0);
    }

    #[test]
    fn test_detects_overlapping_spheres() {
        let mut world = hecs::World::new();
        let a = sphere_at(&mut world, 0.0, RigidBody::new_dynamic());
        let b = sphere_at(&mut world, 1.5, RigidBody::new_dynamic());
        let _far = sphere_at(&mut world, 10.0, RigidBody::new_dynamic());
        let mut system = broadphase();
        for e in system_entities(&world) {
            system.add_body(e).unwrap();
        }
        let log = record(&mut system);

        system.detect(&world, false).unwrap();
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        let pair: HashSet<Entity> = [log[0].body1, log[0].body2].into();
        assert_eq!(pair, HashSet::from([a, b]));
        assert!((log[0].penetration - 0.5).abs() < 1e-2);
    }

    #[test]
    fn test_static_pairs_never_collide() {
        let mut world = hecs::World::new();
        sphere_at(&mut world, 0.0, RigidBody::new_static());
        sphere_at(&mut world, 0.5, RigidBody::new_static());
        sphere_at(&mut world, 1.0, RigidBody { is_active: false, ..RigidBody::new_dynamic() });
        let mut system = broadphase();
        for e in system_entities(&world) {
            system.add_body(e).unwrap();
        }
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        system.hooks_mut().on_passed_broadphase(move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
            true
        });
        let log = record(&mut system);

        system.detect(&world, false).unwrap();
        system.detect(&world, true).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_broadphase_hook_vetoes_pair() {
        let mut world = hecs::World::new();
        sphere_at(&mut world, 0.0, RigidBody::new_dynamic());
        sphere_at(&mut world, 1.0, RigidBody::new_dynamic());
        let mut system = broadphase();
        for e in system_entities(&world) {
            system.add_body(e).unwrap();
        }
        system.hooks_mut().on_passed_broadphase(|_, _| false);
        let log = record(&mut system);
        system.detect(&world, true).unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_body_order_alternates() {
        let mut world = hecs::World::new();
        let bodies: Vec<Entity> = (0..3)
            .map(|i| sphere_at(&mut world, i as f32 * 0.1, RigidBody::new_dynamic()))
            .collect();
        let mut system = broadphase();
        for e in &bodies {
            system.add_body(*e).unwrap();
        }
        let log = record(&mut system);
        system.detect(&world, false).unwrap();

        // Pairs in scan order: (0,1), (0,2), (1,2); the first one is flipped,
        // then every second one after it.
        let log = log.lock().unwrap();
        let order: Vec<(Entity, Entity)> = log.iter().map(|c| (c.body1, c.body2)).collect();
        assert_eq!(
            order,
            vec![
                (bodies[1], bodies[0]),
                (bodies[0], bodies[2]),
                (bodies[2], bodies[1]),
            ]
        );
    }

    #[test]
    fn test_multithreaded_matches_inline() {
        let mut world = hecs::World::new();
        for i in 0..40 {
            let x = (i % 8) as f32 * 1.5;
            let z = (i / 8) as f32 * 1.5;
            spawn_body(
                &mut world,
                Transform::from_position(Vec3::new(x, 0.0, z)),
                RigidBody::new_dynamic(),
                Shape::sphere(1.0),
            );
        }
        let collect = |multithreaded: bool| {
            let mut system = broadphase();
            for e in system_entities(&world) {
                system.add_body(e).unwrap();
            }
            let log = record(&mut system);
            system.detect(&world, multithreaded).unwrap();
            let pairs: HashSet<(Entity, Entity)> = log
                .lock()
                .unwrap()
                .iter()
                .map(|c| (c.body1, c.body2))
                .collect();
            pairs
        };
        let inline = collect(false);
        assert!(!inline.is_empty());
        assert_eq!(inline, collect(true));
    }

    fn system_entities(world: &hecs::World) -> Vec<Entity> {
        let mut entities: Vec<Entity> = world.iter().map(|e| e.entity()).collect();
        entities.sort_by_key(|e| e.id());
        entities
    }
}
