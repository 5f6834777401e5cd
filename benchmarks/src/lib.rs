//! Shared setup helpers for rein-collision benchmarks.
//!
//! ## Running
//!
//! Wall-clock (criterion):
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench collision
//!
//! iai-callgrind (instruction counts, requires valgrind):
//!   cargo install iai-callgrind-runner
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench collision_iai
//!
//! Filter by group:
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench collision -- broadphase

use glam::Vec3;
use rein_collision::collision::terrain::TerrainShape;
use rein_collision::collision::Multishape;
use rein_collision::ecs::components::physics::RigidBody;
use rein_collision::ecs::components::transform::Transform;
use rein_collision::{spawn_body, BroadphaseKind, CollisionWorld, CollisionWorldConfig, Shape};

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// Spawn `n` dynamic spheres in a grid layout so neighbours overlap.
pub fn setup_sphere_world(n: usize) -> hecs::World {
    let mut world = hecs::World::new();
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        let x = (i % cols) as f32 * 1.5;
        let z = (i / cols) as f32 * 1.5;
        spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(x, 0.0, z)),
            RigidBody::new_dynamic(),
            Shape::sphere(1.0),
        );
    }
    world
}

/// Mixed scene: dynamic spheres and boxes alternating with static boxes.
pub fn setup_mixed_world(n: usize) -> hecs::World {
    let mut world = hecs::World::new();
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        let x = (i % cols) as f32 * 1.5;
        let z = (i / cols) as f32 * 1.5;
        let transform = Transform::from_position(Vec3::new(x, 0.0, z));
        match i % 3 {
            0 => spawn_body(&mut world, transform, RigidBody::new_dynamic(), Shape::sphere(1.0)),
            1 => spawn_body(
                &mut world,
                transform,
                RigidBody::new_dynamic(),
                Shape::cuboid(Vec3::splat(0.8)),
            ),
            _ => spawn_body(
                &mut world,
                transform,
                RigidBody::new_static(),
                Shape::cuboid(Vec3::new(0.8, 0.4, 0.8)),
            ),
        };
    }
    world
}

/// Widely spaced spheres with almost no overlaps.
pub fn setup_sparse_world(n: usize) -> hecs::World {
    let mut world = hecs::World::new();
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        let x = (i % cols) as f32 * 10.0;
        let z = (i / cols) as f32 * 10.0;
        spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(x, 0.0, z)),
            RigidBody::new_dynamic(),
            Shape::sphere(1.0),
        );
    }
    world
}

/// Rolling terrain of `size` x `size` samples with `n` spheres resting on it.
pub fn setup_terrain_world(size: usize, n: usize) -> hecs::World {
    let mut world = hecs::World::new();
    let heights = (0..size * size)
        .map(|i| {
            let x = (i % size) as f32;
            let z = (i / size) as f32;
            (x * 0.3).sin() * 0.5 + (z * 0.2).cos() * 0.5
        })
        .collect();
    let terrain = TerrainShape::new(heights, size, size, 1.0, 1.0)
        .expect("benchmark terrain is well formed");
    spawn_body(
        &mut world,
        Transform::identity(),
        RigidBody::new_static(),
        Multishape::from(terrain),
    );

    let cols = (n as f32).sqrt().ceil() as usize;
    let spacing = (size - 1) as f32 / (cols + 1) as f32;
    for i in 0..n {
        let x = (i % cols + 1) as f32 * spacing;
        let z = (i / cols + 1) as f32 * spacing;
        spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(x, 0.2, z)),
            RigidBody::new_dynamic(),
            Shape::sphere(0.5),
        );
    }
    world
}

/// Collision world with every body of `world` registered, stepped once so
/// the sweep-and-prune lists are warm.
pub fn setup_collision(
    world: &mut hecs::World,
    broadphase: BroadphaseKind,
    multithreaded: bool,
) -> anyhow::Result<CollisionWorld> {
    let config = CollisionWorldConfig {
        broadphase,
        multithreaded,
        ..CollisionWorldConfig::default()
    };
    let mut collision = CollisionWorld::from_world(world, config)?;
    collision.step(world)?;
    Ok(collision)
}

/// Nudge every dynamic body so incremental sorting has work to do.
pub fn jitter_bodies(world: &mut hecs::World, frame: usize) {
    for (entity, (transform, body)) in world.query_mut::<(&mut Transform, &RigidBody)>() {
        if body.is_static() {
            continue;
        }
        let phase = (frame as f32) * 0.7 + entity.id() as f32;
        transform.position += Vec3::new(phase.sin(), 0.0, phase.cos()) * 0.05;
    }
}
