//! Headless collision demo: spheres and boxes falling onto a terrain.
//!
//! Run with `RUST_LOG=debug cargo run` from the `collision-demo/` directory
//! to see the library's own log output.

use std::collections::HashSet;

use anyhow::Context;
use glam::{Quat, Vec3};
use rein_collision::collision::terrain::TerrainShape;
use rein_collision::collision::Multishape;
use rein_collision::ecs::components::physics::RigidBody;
use rein_collision::ecs::components::transform::Transform;
use rein_collision::{spawn_body, BroadphaseKind, CollisionWorld, CollisionWorldConfig, Shape};

const FRAMES: usize = 120;
const DT: f32 = 1.0 / 60.0;

/// Velocity per falling body; the demo has no solver so contacts only stop
/// bodies in place.
struct Velocity(Vec3);

fn build_scene(world: &mut hecs::World) -> anyhow::Result<()> {
    let size = 32;
    let heights = (0..size * size)
        .map(|i| {
            let x = (i % size) as f32;
            let z = (i / size) as f32;
            (x * 0.4).sin() * 0.6 + (z * 0.3).cos() * 0.4
        })
        .collect();
    let terrain = TerrainShape::new(heights, size, size, 1.0, 1.0).context("terrain")?;
    spawn_body(
        world,
        Transform::identity(),
        RigidBody::new_static(),
        Multishape::from(terrain),
    );

    for i in 0..24 {
        let x = 4.0 + (i % 6) as f32 * 4.0;
        let z = 4.0 + (i / 6) as f32 * 5.0;
        let position = Vec3::new(x, 3.0 + (i % 4) as f32, z);
        let shape = match i % 3 {
            0 => Shape::sphere(0.5),
            1 => Shape::cuboid(Vec3::splat(0.4)),
            _ => Shape::capsule(0.3, 0.4),
        };
        let entity = spawn_body(
            world,
            Transform::from_position_rotation(position, Quat::from_rotation_y(i as f32 * 0.4)),
            RigidBody::new_dynamic(),
            shape,
        );
        world.insert_one(entity, Velocity(Vec3::ZERO))?;
    }
    Ok(())
}

fn integrate(world: &mut hecs::World, resting: &HashSet<hecs::Entity>) {
    for (entity, (transform, velocity)) in world.query_mut::<(&mut Transform, &mut Velocity)>() {
        if resting.contains(&entity) {
            velocity.0 = Vec3::ZERO;
            continue;
        }
        velocity.0.y -= 9.81 * DT;
        transform.position += velocity.0 * DT;
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut world = hecs::World::new();
    build_scene(&mut world)?;

    let config = CollisionWorldConfig {
        broadphase: BroadphaseKind::SweepAndPrune,
        ..CollisionWorldConfig::default()
    };
    let mut collision = CollisionWorld::from_world(&mut world, config)?;
    log::info!("{} bodies registered", collision.system().body_count());

    let mut resting = HashSet::new();
    for frame in 0..FRAMES {
        integrate(&mut world, &resting);
        let contacts = collision.step(&mut world)?;
        for contact in &contacts {
            resting.insert(contact.body1);
            resting.insert(contact.body2);
        }
        if frame % 20 == 0 {
            log::info!(
                "frame {frame}: {} contacts, {} bodies at rest",
                contacts.len(),
                resting.len()
            );
        }
    }

    let hit = collision.raycast(&world, Vec3::new(16.0, 20.0, 16.0), Vec3::NEG_Y * 40.0, None)?;
    match hit {
        Some(hit) => log::info!(
            "ray from above hit {:?} at t = {:.3}, normal {:?}",
            hit.entity,
            hit.fraction,
            hit.normal
        ),
        None => log::info!("ray from above hit nothing"),
    }

    Ok(())
}
