//! GJK-based ray casting against support-mapped shapes.
//!
//! Implements the conservative-advancement ray cast of van den Bergen: the
//! ray point `x` advances along the ray whenever a support plane separates it
//! from the shape, while a simplex of support points tracks the closest
//! point of the shape to `x`.

use glam::{Mat3, Vec3};

use super::shape::{support_transformed, SupportMap};

/// Upper bound on GJK iterations per ray cast.
pub const MAX_ITERATIONS: usize = 30;

/// Squared distance at which the ray point counts as on the surface.
const CONVERGENCE_EPSILON: f32 = 1e-6;

const DUPLICATE_EPSILON: f32 = 1e-12;

/// Simplex of up to four support points.
#[derive(Debug, Default, Clone, Copy)]
struct Simplex {
    points: [Vec3; 4],
    len: usize,
}

impl Simplex {
    fn contains(&self, p: Vec3) -> bool {
        self.points[..self.len]
            .iter()
            .any(|q| (*q - p).length_squared() < DUPLICATE_EPSILON)
    }

    fn push(&mut self, p: Vec3) {
        if self.len < 4 {
            self.points[self.len] = p;
            self.len += 1;
        }
    }

    /// Keep only the points whose bit is set in `mask`.
    fn retain(&mut self, mask: u8) {
        let mut kept = 0;
        for i in 0..self.len {
            if mask & (1 << i) != 0 {
                self.points[kept] = self.points[i];
                kept += 1;
            }
        }
        self.len = kept;
    }

    /// Closest point of the simplex hull to `x`, reducing the simplex to the
    /// smallest subset that still contains that point.
    fn closest(&mut self, x: Vec3) -> Vec3 {
        let p = self.points;
        let (point, mask) = match self.len {
            0 => return x,
            1 => (p[0], 0b0001),
            2 => closest_on_segment(x, p[0], p[1], [0, 1]),
            3 => closest_on_triangle(x, p[0], p[1], p[2], [0, 1, 2]),
            _ => closest_on_tetrahedron(x, p),
        };
        self.retain(mask);
        point
    }
}

fn closest_on_segment(x: Vec3, a: Vec3, b: Vec3, ids: [u8; 2]) -> (Vec3, u8) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < DUPLICATE_EPSILON {
        return (a, 1 << ids[0]);
    }
    let t = (x - a).dot(ab) / len_sq;
    if t <= 0.0 {
        (a, 1 << ids[0])
    } else if t >= 1.0 {
        (b, 1 << ids[1])
    } else {
        (a + ab * t, (1 << ids[0]) | (1 << ids[1]))
    }
}

/// Closest point on triangle `abc` to `x` by Voronoi region classification.
fn closest_on_triangle(x: Vec3, a: Vec3, b: Vec3, c: Vec3, ids: [u8; 3]) -> (Vec3, u8) {
    let [ia, ib, ic] = ids.map(|i| 1u8 << i);
    let ab = b - a;
    let ac = c - a;

    let ap = x - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, ia);
    }

    let bp = x - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, ib);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, ia | ib);
    }

    let cp = x - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, ic);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, ia | ic);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, ib | ic);
    }

    let sum = va + vb + vc;
    if sum.abs() < DUPLICATE_EPSILON {
        // Degenerate triangle: fall back to its edges.
        let [sa, sb, sc] = ids;
        return [
            closest_on_segment(x, a, b, [sa, sb]),
            closest_on_segment(x, b, c, [sb, sc]),
            closest_on_segment(x, a, c, [sa, sc]),
        ]
        .into_iter()
        .min_by(|l, r| {
            (l.0 - x)
                .length_squared()
                .total_cmp(&(r.0 - x).length_squared())
        })
        .unwrap_or((a, ia));
    }
    let denom = 1.0 / sum;
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, ia | ib | ic)
}

/// Is `x` on the other side of plane `abc` than `d`? Flat tetrahedra count
/// as outside every face.
fn outside_of_plane(x: Vec3, a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> bool {
    let n = (b - a).cross(c - a);
    let sign_x = (x - a).dot(n);
    let sign_d = (d - a).dot(n);
    sign_d.abs() < DUPLICATE_EPSILON || sign_x * sign_d < 0.0
}

fn closest_on_tetrahedron(x: Vec3, p: [Vec3; 4]) -> (Vec3, u8) {
    const FACES: [([u8; 3], u8); 4] = [
        ([0, 1, 2], 3),
        ([0, 2, 3], 1),
        ([0, 3, 1], 2),
        ([1, 3, 2], 0),
    ];

    let mut best = (x, 0b1111);
    let mut best_sq = f32::MAX;
    let mut inside = true;
    for (face, opposite) in FACES {
        let [i, j, k] = face;
        let (a, b, c) = (p[i as usize], p[j as usize], p[k as usize]);
        if outside_of_plane(x, a, b, c, p[opposite as usize]) {
            inside = false;
            let candidate = closest_on_triangle(x, a, b, c, face);
            let dist_sq = (candidate.0 - x).length_squared();
            if dist_sq < best_sq {
                best_sq = dist_sq;
                best = candidate;
            }
        }
    }
    if inside {
        (x, 0b1111)
    } else {
        best
    }
}

/// Cast the half-line `origin + t * direction` (`t >= 0`) against a shape
/// placed at `position` with rotation `orientation`.
///
/// Returns the hit parameter `t` and the outward surface normal. A ray
/// starting inside the shape hits at `t = 0` with a zero normal.
pub fn raycast<S: SupportMap + ?Sized>(
    shape: &S,
    orientation: &Mat3,
    position: Vec3,
    origin: Vec3,
    direction: Vec3,
) -> Option<(f32, Vec3)> {
    let mut simplex = Simplex::default();
    let mut lambda = 0.0;
    let mut x = origin;
    let mut normal = Vec3::ZERO;

    let arbitrary = support_transformed(shape, orientation, position, direction);
    let mut v = x - arbitrary;
    let mut dist_sq = v.length_squared();
    let mut iterations = 0;

    while dist_sq > CONVERGENCE_EPSILON && iterations < MAX_ITERATIONS {
        iterations += 1;

        let p = support_transformed(shape, orientation, position, v);
        let w = x - p;
        let v_dot_w = v.dot(w);
        if v_dot_w > 0.0 {
            let v_dot_r = v.dot(direction);
            if v_dot_r >= -f32::EPSILON {
                return None;
            }
            lambda -= v_dot_w / v_dot_r;
            x = origin + direction * lambda;
            normal = v;
        }

        if !simplex.contains(p) {
            simplex.push(p);
        }
        v = x - simplex.closest(x);
        dist_sq = v.length_squared();
    }

    Some((lambda, normal.normalize_or_zero()))
}
