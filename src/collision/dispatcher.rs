//! Pairwise detection and ray casting shared by every broadphase.

use glam::Vec3;

use super::body::CollisionBody;
use super::contact::{BodyRayHit, Collision, RaycastHit};
use super::events::{CollisionHooks, RaycastFilter};
use super::gjk;
use super::multishape::{Multishape, MultishapeKind};
use super::narrowphase;
use super::shape::{Shape, SupportMap};
use super::CollisionConfig;

/// Runs the narrowphase for candidate pairs and fires the hooks.
///
/// Shared by reference between worker tasks during a parallel pass, so all
/// methods take `&self`.
#[derive(Debug, Default)]
pub struct CollisionDispatcher {
    pub config: CollisionConfig,
    pub hooks: CollisionHooks,
}

impl CollisionDispatcher {
    /// Create a new dispatcher with no hooks installed.
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            hooks: CollisionHooks::default(),
        }
    }

    /// Pairs where neither body can move are never tested.
    #[inline]
    pub fn check_both_static_or_inactive(body1: &CollisionBody, body2: &CollisionBody) -> bool {
        body1.is_static_or_inactive() && body2.is_static_or_inactive()
    }

    /// Do the world bounds of the two bodies touch?
    #[inline]
    pub fn check_bounding_boxes(body1: &CollisionBody, body2: &CollisionBody) -> bool {
        body1.bounding_box.overlaps(&body2.bounding_box)
    }

    fn uses_face_normal(&self, kind: MultishapeKind) -> bool {
        match kind {
            MultishapeKind::Terrain => self.config.use_terrain_normal,
            MultishapeKind::TriangleMesh => self.config.use_triangle_mesh_normal,
            MultishapeKind::Compound => false,
        }
    }

    /// Run the narrowphase on one pair that passed the broadphase.
    pub fn detect(&self, body1: &CollisionBody, body2: &CollisionBody) {
        match (&body1.shape, &body2.shape) {
            (Shape::Convex(s1), Shape::Convex(s2)) => self.collide(body1, body2, s1, s2, None),
            (Shape::Multi(m1), Shape::Multi(m2)) => self.detect_multi_multi(body1, body2, m1, m2),
            (Shape::Multi(m), Shape::Convex(s)) => self.detect_multi_convex(body1, body2, m, s),
            (Shape::Convex(s), Shape::Multi(m)) => self.detect_multi_convex(body2, body1, m, s),
        }
    }

    /// Narrowphase on two support maps, then the narrowphase hook, support
    /// points, optional face normal and the detected hook.
    fn collide<A, B>(
        &self,
        body1: &CollisionBody,
        body2: &CollisionBody,
        s1: &A,
        s2: &B,
        face_normal: Option<Vec3>,
    ) where
        A: SupportMap + ?Sized,
        B: SupportMap + ?Sized,
    {
        let Some(info) = narrowphase::detect(
            s1,
            s2,
            &body1.orientation,
            &body2.orientation,
            body1.position,
            body2.position,
        ) else {
            return;
        };

        let mut point = info.point;
        let mut normal = info.normal;
        if !self.hooks.raise_passed_narrowphase(
            body1.entity,
            body2.entity,
            &mut point,
            &mut normal,
            info.penetration,
        ) {
            return;
        }

        let (point1, point2) = find_support_points(body1, body2, s1, s2, point, normal);
        if let Some(local) = face_normal {
            normal = body1.orientation * local;
        }

        self.hooks.raise_collision_detected(&Collision {
            body1: body1.entity,
            body2: body2.entity,
            point1,
            point2,
            normal,
            penetration: info.penetration,
        });
    }

    fn detect_multi_multi(
        &self,
        body1: &CollisionBody,
        body2: &CollisionBody,
        m1: &Multishape,
        m2: &Multishape,
    ) {
        let mut ms1 = m1.request_working_clone();
        let mut ms2 = m2.request_working_clone();

        let count1 = ms1.prepare(&body1.to_local_aabb(&body2.bounding_box));
        let count2 = ms2.prepare(&body2.to_local_aabb(&body1.bounding_box));
        if count1 == 0 || count2 == 0 {
            return;
        }

        for i in 0..count1 {
            ms1.set_current_shape(i);
            for j in 0..count2 {
                ms2.set_current_shape(j);
                self.collide(body1, body2, &ms1, &ms2, None);
            }
        }
    }

    /// `body1` carries the multishape.
    fn detect_multi_convex<S>(
        &self,
        body1: &CollisionBody,
        body2: &CollisionBody,
        multi: &Multishape,
        convex: &S,
    ) where
        S: SupportMap + ?Sized,
    {
        let mut ms = multi.request_working_clone();
        let count = ms.prepare(&body1.to_local_aabb(&body2.bounding_box));
        let override_normal = self.uses_face_normal(ms.kind());

        for i in 0..count {
            ms.set_current_shape(i);
            let face_normal = if override_normal {
                ms.collision_normal()
            } else {
                None
            };
            self.collide(body1, body2, &ms, convex, face_normal);
        }
    }

    /// Ray cast against one body. The bounding box is tested first.
    pub fn raycast_body(
        &self,
        body: &CollisionBody,
        origin: Vec3,
        direction: Vec3,
    ) -> Option<BodyRayHit> {
        if !body.bounding_box.intersects_ray(origin, direction) {
            return None;
        }

        match &body.shape {
            Shape::Convex(shape) => gjk::raycast(
                shape,
                &body.orientation,
                body.position,
                origin,
                direction,
            )
            .map(|(fraction, normal)| BodyRayHit { normal, fraction }),
            Shape::Multi(multi) => self.raycast_multishape(body, multi, origin, direction),
        }
    }

    fn raycast_multishape(
        &self,
        body: &CollisionBody,
        multi: &Multishape,
        origin: Vec3,
        direction: Vec3,
    ) -> Option<BodyRayHit> {
        let mut ms = multi.request_working_clone();
        let count = ms.prepare_ray(
            body.to_local_point(origin),
            body.to_local_direction(direction),
        );
        let override_normal = self.uses_face_normal(ms.kind());

        let mut best: Option<BodyRayHit> = None;
        for i in 0..count {
            ms.set_current_shape(i);
            let Some((fraction, mut normal)) =
                gjk::raycast(&ms, &body.orientation, body.position, origin, direction)
            else {
                continue;
            };
            if best.is_some_and(|b| fraction >= b.fraction) {
                continue;
            }
            if override_normal {
                if let Some(local) = ms.collision_normal() {
                    normal = -(body.orientation * local);
                }
            }
            best = Some(BodyRayHit { normal, fraction });
        }
        best
    }

    /// Closest hit over `bodies` accepted by `filter`. Ties keep the body
    /// found first.
    pub fn raycast_scene(
        &self,
        bodies: &[CollisionBody],
        origin: Vec3,
        direction: Vec3,
        filter: Option<&RaycastFilter>,
    ) -> Option<RaycastHit> {
        let mut best: Option<RaycastHit> = None;
        for body in bodies {
            let Some(hit) = self.raycast_body(body, origin, direction) else {
                continue;
            };
            let closer = best.map_or(true, |b| hit.fraction < b.fraction);
            if closer && filter.map_or(true, |f| f(body.entity, hit.normal, hit.fraction)) {
                best = Some(RaycastHit {
                    entity: body.entity,
                    normal: hit.normal,
                    fraction: hit.fraction,
                });
            }
        }
        best
    }
}

/// Support points on both bodies along the contact normal, projected onto
/// the normal through the contact point.
fn find_support_points<A, B>(
    body1: &CollisionBody,
    body2: &CollisionBody,
    s1: &A,
    s2: &B,
    point: Vec3,
    normal: Vec3,
) -> (Vec3, Vec3)
where
    A: SupportMap + ?Sized,
    B: SupportMap + ?Sized,
{
    let sa = body1.support(s1, -normal) - point;
    let sb = body2.support(s2, normal) - point;
    (
        point + normal * sa.dot(normal),
        point + normal * sb.dot(normal),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::terrain::TerrainShape;
    use crate::ecs::bridge::spawn_body;
    use crate::ecs::components::physics::RigidBody;
    use crate::ecs::components::transform::Transform;
    use std::sync::{Arc, Mutex};

    fn capture(world: &hecs::World, entity: hecs::Entity) -> CollisionBody {
        CollisionBody::capture(world, entity).unwrap()
    }

    fn recording_dispatcher() -> (CollisionDispatcher, Arc<Mutex<Vec<Collision>>>) {
        let mut dispatcher = CollisionDispatcher::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        dispatcher
            .hooks
            .on_collision_detected(move |c| sink.lock().unwrap().push(*c));
        (dispatcher, log)
    }

    #[test]
    fn test_box_pair_support_points() {
        let mut world = hecs::World::new();
        let a = spawn_body(
            &mut world,
            Transform::identity(),
            RigidBody::new_dynamic(),
            Shape::cuboid(Vec3::ONE),
        );
        let b = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(1.5, 0.0, 0.0)),
            RigidBody::new_dynamic(),
            Shape::cuboid(Vec3::ONE),
        );
        let (dispatcher, log) = recording_dispatcher();
        dispatcher.detect(&capture(&world, a), &capture(&world, b));

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        let c = log[0];
        assert_eq!(c.body1, a);
        let eps = 1e-3;
        assert!((c.penetration - 0.5).abs() < eps);
        // Deepest point of A toward B and of B toward A along the normal.
        assert!((c.point1.x - 1.0).abs() < eps, "point1 = {:?}", c.point1);
        assert!((c.point2.x - 0.5).abs() < eps, "point2 = {:?}", c.point2);
    }

    #[test]
    fn test_narrowphase_hook_vetoes() {
        let mut world = hecs::World::new();
        let a = spawn_body(&mut world, Transform::identity(), RigidBody::new_dynamic(), Shape::sphere(1.0));
        let b = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
            RigidBody::new_dynamic(),
            Shape::sphere(1.0),
        );
        let (mut dispatcher, log) = recording_dispatcher();
        dispatcher.hooks.on_passed_narrowphase(|_, _, _, _, _| false);
        dispatcher.detect(&capture(&world, a), &capture(&world, b));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sphere_on_terrain_uses_face_normal() {
        let mut world = hecs::World::new();
        let terrain = TerrainShape::flat(9, 9, 1.0).unwrap();
        let ground = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(-4.0, 0.0, -4.0)),
            RigidBody::new_static(),
            Multishape::from(terrain),
        );
        let ball = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(0.3, 0.9, 0.2)),
            RigidBody::new_dynamic(),
            Shape::sphere(1.0),
        );
        let (dispatcher, log) = recording_dispatcher();
        // Convex first: the dispatcher moves the multishape to the left.
        dispatcher.detect(&capture(&world, ball), &capture(&world, ground));

        let log = log.lock().unwrap();
        assert!(!log.is_empty());
        let eps = 1e-5;
        for c in log.iter() {
            assert_eq!(c.body1, ground);
            assert_eq!(c.body2, ball);
            assert!((c.normal + Vec3::Y).length() < eps, "normal = {:?}", c.normal);
            assert!(c.penetration >= 0.0);
        }
    }

    #[test]
    fn test_terrain_normal_override_can_be_disabled() {
        let mut world = hecs::World::new();
        let terrain = TerrainShape::flat(9, 9, 1.0).unwrap();
        let ground = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(-4.0, 0.0, -4.0)),
            RigidBody::new_static(),
            Multishape::from(terrain),
        );
        let ball = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(0.3, 0.9, 0.2)),
            RigidBody::new_dynamic(),
            Shape::sphere(1.0),
        );
        let (mut dispatcher, log) = recording_dispatcher();
        dispatcher.config.use_terrain_normal = false;
        dispatcher.detect(&capture(&world, ground), &capture(&world, ball));
        let log = log.lock().unwrap();
        assert!(!log.is_empty());
        for c in log.iter() {
            assert!(c.normal.is_finite());
            assert!((c.normal.length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_multishape_far_from_convex_prepares_nothing() {
        let mut world = hecs::World::new();
        let ground = spawn_body(
            &mut world,
            Transform::identity(),
            RigidBody::new_static(),
            Multishape::from(TerrainShape::flat(4, 4, 1.0).unwrap()),
        );
        let ball = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(1.5, 5.0, 1.5)),
            RigidBody::new_dynamic(),
            Shape::sphere(1.0),
        );
        let (dispatcher, log) = recording_dispatcher();
        dispatcher.detect(&capture(&world, ground), &capture(&world, ball));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_raycast_scene_closest_and_filter() {
        let mut world = hecs::World::new();
        let near = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(0.0, 0.0, -3.0)),
            RigidBody::new_dynamic(),
            Shape::sphere(1.0),
        );
        let far = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(0.0, 0.0, 3.0)),
            RigidBody::new_dynamic(),
            Shape::sphere(1.0),
        );
        let bodies = vec![capture(&world, far), capture(&world, near)];
        let dispatcher = CollisionDispatcher::default();
        let origin = Vec3::new(0.0, 0.0, -10.0);

        let hit = dispatcher
            .raycast_scene(&bodies, origin, Vec3::Z, None)
            .expect("hit");
        assert_eq!(hit.entity, near);
        assert!((hit.fraction - 6.0).abs() < 1e-3);

        let skip_near: &RaycastFilter = &move |e, _, _| e != near;
        let hit = dispatcher
            .raycast_scene(&bodies, origin, Vec3::Z, Some(skip_near))
            .expect("hit");
        assert_eq!(hit.entity, far);
        assert!((hit.fraction - 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_raycast_terrain_reports_outward_normal() {
        let mut world = hecs::World::new();
        let ground = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(-4.0, 0.0, -4.0)),
            RigidBody::new_static(),
            Multishape::from(TerrainShape::flat(9, 9, 1.0).unwrap()),
        );
        let dispatcher = CollisionDispatcher::default();
        let hit = dispatcher
            .raycast_body(&capture(&world, ground), Vec3::new(0.25, 10.0, 0.25), Vec3::new(0.0, -20.0, 0.0))
            .expect("ray hits terrain");
        let eps = 1e-3;
        assert!((hit.normal - Vec3::Y).length() < eps, "normal = {:?}", hit.normal);
        // Triangles carry a small expansion above the surface.
        assert!((hit.fraction - 9.95 / 20.0).abs() < 1e-3, "fraction = {}", hit.fraction);
    }

    #[test]
    fn test_terrain_ray_is_a_segment() {
        let mut world = hecs::World::new();
        let ground = spawn_body(
            &mut world,
            Transform::from_position(Vec3::new(-4.0, 0.0, -4.0)),
            RigidBody::new_static(),
            Multishape::from(TerrainShape::flat(9, 9, 1.0).unwrap()),
        );
        let dispatcher = CollisionDispatcher::default();
        let body = capture(&world, ground);

        // A unit direction ten units above the ground ends at y = 9.
        assert!(dispatcher
            .raycast_body(&body, Vec3::new(0.2, 10.0, 0.2), -Vec3::Y)
            .is_none());
        assert!(dispatcher
            .raycast_body(&body, Vec3::new(0.2, 0.5, 0.2), -Vec3::Y)
            .is_some());
    }
}
