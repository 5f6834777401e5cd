//! Collision benchmarks (iai-callgrind - instruction counts).
//!
//! Prerequisites:
//!   cargo install iai-callgrind-runner
//!   sudo dnf install valgrind   # Fedora/WSL2
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench collision_iai
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench collision_iai -- broadphase

use std::hint::black_box;

use glam::{Mat3, Vec3};
use iai_callgrind::{library_benchmark, library_benchmark_group, main};
use rein_collision::collision::gjk;
use rein_collision::collision::narrowphase::detect;
use rein_collision::{BroadphaseKind, ConvexShape};
use rein_collision_bench::*;

// ---------------------------------------------------------------------------
// Broadphase
// ---------------------------------------------------------------------------

fn run_broadphase(mut world: hecs::World, broadphase: BroadphaseKind) {
    let mut collision = setup_collision(&mut world, broadphase, false).expect("collision world");
    black_box(collision.step(&mut world).expect("step"));
}

#[library_benchmark]
fn broadphase_100() {
    run_broadphase(setup_sphere_world(black_box(100)), BroadphaseKind::SweepAndPrune);
}

#[library_benchmark]
fn broadphase_500() {
    run_broadphase(setup_sphere_world(black_box(500)), BroadphaseKind::SweepAndPrune);
}

#[library_benchmark]
fn broadphase_brute_force_500() {
    run_broadphase(setup_sphere_world(black_box(500)), BroadphaseKind::BruteForce);
}

#[library_benchmark]
fn broadphase_mixed_500() {
    run_broadphase(setup_mixed_world(black_box(500)), BroadphaseKind::SweepAndPrune);
}

#[library_benchmark]
fn broadphase_sparse_500() {
    run_broadphase(setup_sparse_world(black_box(500)), BroadphaseKind::SweepAndPrune);
}

library_benchmark_group!(
    name = broadphase_group;
    benchmarks =
        broadphase_100,
        broadphase_500,
        broadphase_brute_force_500,
        broadphase_mixed_500,
        broadphase_sparse_500
);

// ---------------------------------------------------------------------------
// Narrowphase
// ---------------------------------------------------------------------------

#[library_benchmark]
fn narrowphase_sphere_sphere_hit() {
    let shape = ConvexShape::Sphere { radius: 1.0 };
    black_box(detect(&shape, &shape, &Mat3::IDENTITY, &Mat3::IDENTITY, Vec3::ZERO, Vec3::new(1.5, 0.0, 0.0)));
}

#[library_benchmark]
fn narrowphase_box_box_hit() {
    let shape = ConvexShape::Box {
        half_extents: Vec3::splat(1.0),
    };
    black_box(detect(&shape, &shape, &Mat3::IDENTITY, &Mat3::IDENTITY, Vec3::ZERO, Vec3::new(1.5, 0.0, 0.0)));
}

#[library_benchmark]
fn narrowphase_box_box_miss() {
    let shape = ConvexShape::Box {
        half_extents: Vec3::splat(1.0),
    };
    black_box(detect(&shape, &shape, &Mat3::IDENTITY, &Mat3::IDENTITY, Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)));
}

#[library_benchmark]
fn narrowphase_terrain_16() {
    let mut world = setup_terrain_world(black_box(64), 16);
    let mut collision =
        setup_collision(&mut world, BroadphaseKind::SweepAndPrune, false).expect("collision world");
    black_box(collision.step(&mut world).expect("step"));
}

library_benchmark_group!(
    name = narrowphase_group;
    benchmarks =
        narrowphase_sphere_sphere_hit,
        narrowphase_box_box_hit,
        narrowphase_box_box_miss,
        narrowphase_terrain_16
);

// ---------------------------------------------------------------------------
// Raycast
// ---------------------------------------------------------------------------

#[library_benchmark]
fn raycast_box_hit() {
    let shape = ConvexShape::Box {
        half_extents: Vec3::splat(1.0),
    };
    black_box(gjk::raycast(
        &shape,
        &Mat3::from_rotation_y(0.3),
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::ZERO,
        Vec3::Z,
    ));
}

#[library_benchmark]
fn raycast_scene_100() {
    let mut world = setup_sphere_world(black_box(100));
    let collision =
        setup_collision(&mut world, BroadphaseKind::SweepAndPrune, false).expect("collision world");
    black_box(collision.raycast(&world, Vec3::new(-5.0, 0.0, 0.75), Vec3::X, None).expect("raycast"));
}

library_benchmark_group!(
    name = raycast_group;
    benchmarks =
        raycast_box_hit,
        raycast_scene_100
);

main!(
    library_benchmark_groups = broadphase_group,
    narrowphase_group,
    raycast_group
);
