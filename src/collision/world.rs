//! Frame driver tying a collision system to a hecs world.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use glam::Vec3;
use hecs::Entity;

use super::brute_force::BruteForce;
use super::contact::{BodyRayHit, Collision, RaycastHit};
use super::events::RaycastFilter;
use super::sweep_and_prune::SweepAndPrune;
use super::{CollisionConfig, CollisionSystem};
use crate::ecs::components::physics::{Collider, RigidBody};
use crate::ecs::components::transform::Transform;
use crate::ecs::systems::bounding_box_system;
use crate::task::TaskPool;
use crate::CollisionError;

/// Which broadphase a [`CollisionWorld`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadphaseKind {
    /// Test every pair. Good for a handful of bodies.
    BruteForce,
    /// Persistent sweep-and-prune.
    #[default]
    SweepAndPrune,
}

/// Configuration for a [`CollisionWorld`].
#[derive(Debug, Clone)]
pub struct CollisionWorldConfig {
    pub collision: CollisionConfig,
    /// Default: sweep-and-prune.
    pub broadphase: BroadphaseKind,
    /// Dispatch narrowphase work on the task pool. Default: true.
    pub multithreaded: bool,
    /// Worker threads; 0 picks one per logical core. Default: 0.
    pub worker_threads: usize,
}

impl Default for CollisionWorldConfig {
    fn default() -> Self {
        Self {
            collision: CollisionConfig::default(),
            broadphase: BroadphaseKind::default(),
            multithreaded: true,
            worker_threads: 0,
        }
    }
}

type ContactBuffer = Arc<Mutex<Vec<Collision>>>;

fn record(contacts: &ContactBuffer, collision: &Collision) {
    contacts
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(*collision);
}

fn make_system(
    kind: BroadphaseKind,
    config: CollisionConfig,
    pool: Arc<TaskPool>,
) -> Box<dyn CollisionSystem> {
    match kind {
        BroadphaseKind::BruteForce => Box::new(BruteForce::new(config, pool)),
        BroadphaseKind::SweepAndPrune => Box::new(SweepAndPrune::new(config, pool)),
    }
}

/// Owns a collision system and collects the collisions of each step.
pub struct CollisionWorld {
    config: CollisionWorldConfig,
    pool: Arc<TaskPool>,
    system: Box<dyn CollisionSystem>,
    contacts: ContactBuffer,
}

impl CollisionWorld {
    pub fn new(config: CollisionWorldConfig) -> Result<Self, CollisionError> {
        let pool = Arc::new(TaskPool::new(config.worker_threads)?);
        let mut system = make_system(config.broadphase, config.collision.clone(), Arc::clone(&pool));

        let contacts: ContactBuffer = Arc::default();
        let sink = Arc::clone(&contacts);
        system
            .hooks_mut()
            .on_collision_detected(move |collision| record(&sink, collision));

        tracing::debug!(
            broadphase = ?config.broadphase,
            threads = pool.threads(),
            "collision world created"
        );

        Ok(Self {
            config,
            pool,
            system,
            contacts,
        })
    }

    /// Create a world and register every collidable entity already in `world`.
    pub fn from_world(world: &mut hecs::World, config: CollisionWorldConfig) -> anyhow::Result<Self> {
        let mut collision = Self::new(config).context("failed to create collision world")?;
        bounding_box_system(world);
        collision
            .sync_bodies(world)
            .context("failed to register bodies")?;
        Ok(collision)
    }

    pub fn config(&self) -> &CollisionWorldConfig {
        &self.config
    }

    pub fn system(&self) -> &dyn CollisionSystem {
        self.system.as_ref()
    }

    pub fn system_mut(&mut self) -> &mut dyn CollisionSystem {
        self.system.as_mut()
    }

    pub fn set_multithreaded(&mut self, multithreaded: bool) {
        self.config.multithreaded = multithreaded;
    }

    /// Swap the broadphase, keeping registered bodies and installed hooks.
    pub fn set_broadphase(&mut self, kind: BroadphaseKind) -> Result<(), CollisionError> {
        if kind == self.config.broadphase {
            return Ok(());
        }
        let mut system = make_system(kind, self.system.config().clone(), Arc::clone(&self.pool));
        for &entity in self.system.bodies() {
            system.add_body(entity)?;
        }
        *system.hooks_mut() = std::mem::take(self.system.hooks_mut());
        self.system = system;
        self.config.broadphase = kind;
        tracing::debug!(broadphase = ?kind, "broadphase replaced");
        Ok(())
    }

    pub fn add_body(&mut self, entity: Entity) -> Result<(), CollisionError> {
        self.system.add_body(entity)
    }

    pub fn remove_body(&mut self, entity: Entity) -> bool {
        self.system.remove_body(entity)
    }

    /// Register every entity carrying a `Transform`, `RigidBody` and
    /// `Collider`, and drop registered entities that were despawned.
    ///
    /// Returns the number of bodies added.
    pub fn sync_bodies(&mut self, world: &hecs::World) -> Result<usize, CollisionError> {
        let stale: Vec<Entity> = self
            .system
            .bodies()
            .iter()
            .copied()
            .filter(|&entity| !world.contains(entity))
            .collect();
        for entity in stale {
            self.system.remove_body(entity);
        }

        let candidates: Vec<Entity> = world
            .query::<(&Transform, &RigidBody, &Collider)>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();
        let mut added = 0;
        for entity in candidates {
            if !self.system.contains(entity) {
                self.system.add_body(entity)?;
                added += 1;
            }
        }
        Ok(added)
    }

    /// Refresh bounding boxes, run one detection pass and return the
    /// collisions it produced. With multithreading on, their order is
    /// unspecified.
    pub fn step(&mut self, world: &mut hecs::World) -> Result<Vec<Collision>, CollisionError> {
        bounding_box_system(world);
        self.system.detect(world, self.config.multithreaded)?;
        let contacts = std::mem::take(
            &mut *self
                .contacts
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        tracing::trace!(contacts = contacts.len(), "collision step");
        Ok(contacts)
    }

    pub fn on_passed_broadphase(
        &mut self,
        hook: impl Fn(Entity, Entity) -> bool + Send + Sync + 'static,
    ) {
        self.system.hooks_mut().on_passed_broadphase(hook);
    }

    pub fn on_passed_narrowphase(
        &mut self,
        hook: impl Fn(Entity, Entity, &mut Vec3, &mut Vec3, f32) -> bool + Send + Sync + 'static,
    ) {
        self.system.hooks_mut().on_passed_narrowphase(hook);
    }

    /// Subscribe to accepted collisions. They are still collected for
    /// [`step`](Self::step).
    pub fn on_collision_detected(&mut self, hook: impl Fn(&Collision) + Send + Sync + 'static) {
        let sink = Arc::clone(&self.contacts);
        self.system
            .hooks_mut()
            .on_collision_detected(move |collision| {
                hook(collision);
                record(&sink, collision);
            });
    }

    pub fn raycast(
        &self,
        world: &hecs::World,
        origin: Vec3,
        direction: Vec3,
        filter: Option<&RaycastFilter>,
    ) -> Result<Option<RaycastHit>, CollisionError> {
        self.system.raycast(world, origin, direction, filter)
    }

    pub fn raycast_body(
        &self,
        world: &hecs::World,
        entity: Entity,
        origin: Vec3,
        direction: Vec3,
    ) -> Result<Option<BodyRayHit>, CollisionError> {
        self.system.raycast_body(world, entity, origin, direction)
    }
}

impl std::fmt::Debug for CollisionWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionWorld")
            .field("config", &self.config)
            .field("bodies", &self.system.body_count())
            .finish_non_exhaustive()
    }
}
