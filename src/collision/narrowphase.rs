//! Narrowphase collision detection using Minkowski portal refinement
//! (XenoCollide).
//!
//! The detector works on the Minkowski difference `B - A` built from the two
//! support maps. Phase one searches a portal the origin ray passes through,
//! phase two refines it toward the surface of the difference. Both phases
//! are bounded; degenerate portals report no collision.

use glam::{Mat3, Vec3};

use super::contact::ContactInfo;
use super::shape::{support_transformed, SupportMap};

/// Upper bound on iterations of each refinement phase.
pub const MAX_ITERATIONS: usize = 34;

/// Portal refinement stops once the support plane moves less than this.
pub const COLLIDE_EPSILON: f32 = 1e-4;

const NEAR_ZERO: f32 = 1e-12;

/// One vertex of the portal with the two support points it was built from.
#[derive(Debug, Clone, Copy)]
struct PortalPoint {
    v: Vec3,
    a: Vec3,
    b: Vec3,
}

struct Pair<'a, A: ?Sized, B: ?Sized> {
    shape_a: &'a A,
    shape_b: &'a B,
    orientation_a: &'a Mat3,
    orientation_b: &'a Mat3,
    position_a: Vec3,
    position_b: Vec3,
}

impl<A: SupportMap + ?Sized, B: SupportMap + ?Sized> Pair<'_, A, B> {
    /// Support of `B - A` along `n`.
    #[inline]
    fn support(&self, n: Vec3) -> PortalPoint {
        let a = support_transformed(self.shape_a, self.orientation_a, self.position_a, -n);
        let b = support_transformed(self.shape_b, self.orientation_b, self.position_b, n);
        PortalPoint { v: b - a, a, b }
    }
}

fn is_nearly_zero(v: Vec3) -> bool {
    v.length_squared() < NEAR_ZERO
}

/// Test two convex shapes for intersection.
///
/// Returns the contact point (midway between the surfaces), the normal
/// pointing from `shape_b` toward `shape_a` and the penetration depth.
pub fn detect<A, B>(
    shape_a: &A,
    shape_b: &B,
    orientation_a: &Mat3,
    orientation_b: &Mat3,
    position_a: Vec3,
    position_b: Vec3,
) -> Option<ContactInfo>
where
    A: SupportMap + ?Sized,
    B: SupportMap + ?Sized,
{
    let pair = Pair {
        shape_a,
        shape_b,
        orientation_a,
        orientation_b,
        position_a,
        position_b,
    };

    // Interior point of the Minkowski difference.
    let center_a = *orientation_a * shape_a.support_center() + position_a;
    let center_b = *orientation_b * shape_b.support_center() + position_b;
    let mut v0 = center_b - center_a;
    if is_nearly_zero(v0) {
        v0 = Vec3::new(1e-5, 0.0, 0.0);
    }
    let p0 = PortalPoint {
        v: v0,
        a: center_a,
        b: center_b,
    };

    // Support toward the origin.
    let mut normal = -v0;
    let mut p1 = pair.support(normal);
    if p1.v.dot(normal) <= 0.0 {
        return None;
    }

    normal = p1.v.cross(v0);
    if is_nearly_zero(normal) {
        // Origin lies on the line through v0 and v1.
        let normal = (p1.v - v0).normalize();
        let point = (p1.a + p1.b) * 0.5;
        let penetration = (p1.b - p1.a).dot(normal);
        return Some(ContactInfo {
            point,
            normal,
            penetration,
        });
    }

    let mut p2 = pair.support(normal);
    if p2.v.dot(normal) <= 0.0 {
        return None;
    }

    normal = (p1.v - v0).cross(p2.v - v0);
    if normal.dot(v0) > 0.0 {
        std::mem::swap(&mut p1, &mut p2);
        normal = -normal;
    }

    let mut phase1 = 0;
    loop {
        if phase1 > MAX_ITERATIONS {
            return None;
        }
        phase1 += 1;

        let p3 = pair.support(normal);
        if p3.v.dot(normal) <= 0.0 {
            return None;
        }

        // Origin outside (v1, v0, v3): drop v2.
        if p1.v.cross(p3.v).dot(v0) < 0.0 {
            p2 = p3;
            normal = (p1.v - v0).cross(p3.v - v0);
            continue;
        }

        // Origin outside (v3, v0, v2): drop v1.
        if p3.v.cross(p2.v).dot(v0) < 0.0 {
            p1 = p3;
            normal = (p3.v - v0).cross(p2.v - v0);
            continue;
        }

        return refine_portal(&pair, p0, p1, p2, p3);
    }
}

/// Phase two: move the portal (v1, v2, v3) toward the boundary of the
/// Minkowski difference until it is thin enough.
fn refine_portal<A, B>(
    pair: &Pair<'_, A, B>,
    p0: PortalPoint,
    mut p1: PortalPoint,
    mut p2: PortalPoint,
    mut p3: PortalPoint,
) -> Option<ContactInfo>
where
    A: SupportMap + ?Sized,
    B: SupportMap + ?Sized,
{
    let mut hit = false;
    let mut phase2 = 0;

    loop {
        phase2 += 1;

        let normal = (p2.v - p1.v).cross(p3.v - p1.v);
        if is_nearly_zero(normal) {
            return None;
        }
        let normal = normal.normalize();

        // Origin inside the portal's half-space.
        if normal.dot(p1.v) >= 0.0 {
            hit = true;
        }

        let p4 = pair.support(normal);
        let delta = (p4.v - p3.v).dot(normal);
        let penetration = p4.v.dot(normal);

        if delta <= COLLIDE_EPSILON || penetration <= 0.0 || phase2 > MAX_ITERATIONS {
            if !hit {
                return None;
            }
            let point = contact_point(p0, p1, p2, p3, normal);
            return Some(ContactInfo {
                point,
                normal,
                penetration,
            });
        }

        let split = p4.v.cross(p0.v);
        if split.dot(p1.v) >= 0.0 {
            if split.dot(p2.v) >= 0.0 {
                p1 = p4;
            } else {
                p3 = p4;
            }
        } else if split.dot(p3.v) >= 0.0 {
            p2 = p4;
        } else {
            p1 = p4;
        }
    }
}

/// Barycentric blend of the portal's support points, projected onto the
/// origin ray.
fn contact_point(
    p0: PortalPoint,
    p1: PortalPoint,
    p2: PortalPoint,
    p3: PortalPoint,
    normal: Vec3,
) -> Vec3 {
    let (v0, v1, v2, v3) = (p0.v, p1.v, p2.v, p3.v);
    let mut b0 = v1.cross(v2).dot(v3);
    let mut b1 = v3.cross(v2).dot(v0);
    let mut b2 = v0.cross(v1).dot(v3);
    let mut b3 = v2.cross(v1).dot(v0);
    let mut sum = b0 + b1 + b2 + b3;

    if sum <= 0.0 {
        b0 = 0.0;
        b1 = v2.cross(v3).dot(normal);
        b2 = v3.cross(v1).dot(normal);
        b3 = v1.cross(v2).dot(normal);
        sum = b1 + b2 + b3;
    }

    if sum.abs() < f32::EPSILON {
        return (p0.a + p0.b) * 0.5;
    }

    let inv = 1.0 / sum;
    let on_a = p0.a * b0 + p1.a * b1 + p2.a * b2 + p3.a * b3;
    let on_b = p0.b * b0 + p1.b * b1 + p2.b * b2 + p3.b * b3;
    (on_a + on_b) * (inv * 0.5)
}
