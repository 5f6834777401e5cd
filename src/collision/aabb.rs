//! Axis-aligned bounding boxes.

use glam::{Mat3, Vec3};

/// Axis-aligned bounding box used by the broadphases and multishape queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any `grow` call will replace.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box centred on `center` with the given half extents.
    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box containing every point. Returns [`Aabb::EMPTY`] for an
    /// empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut aabb, p| {
            aabb.grow(p);
            aabb
        })
    }

    /// Box spanning the segment `start .. end`.
    pub fn from_segment(start: Vec3, end: Vec3) -> Self {
        Self {
            min: start.min(end),
            max: start.max(end),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Extend the box to contain `point`.
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Test whether two AABBs overlap. Touching boxes overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after rotating by `orientation` and translating
    /// by `position`.
    pub fn transformed(&self, position: Vec3, orientation: &Mat3) -> Aabb {
        let center = *orientation * self.center() + position;
        let e = self.half_extents();
        let extent = orientation.x_axis.abs() * e.x
            + orientation.y_axis.abs() * e.y
            + orientation.z_axis.abs() * e.z;
        Aabb::from_center_extents(center, extent)
    }

    /// Bounds of this world-space box expressed in the frame of a body at
    /// `position` with rotation `orientation`.
    pub fn inverse_transformed(&self, position: Vec3, orientation: &Mat3) -> Aabb {
        let shifted = Aabb::new(self.min - position, self.max - position);
        shifted.transformed(Vec3::ZERO, &orientation.transpose())
    }

    /// Parameter range `[enter, exit]` along `origin + t * direction` for
    /// `t` in `[t_min, t_max]` that lies inside the box.
    pub fn clip_line(&self, origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> Option<(f32, f32)> {
        let mut enter = t_min;
        let mut exit = t_max;
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            enter = enter.max(t0);
            exit = exit.min(t1);
            if enter > exit {
                return None;
            }
        }
        Some((enter, exit))
    }

    /// Does the half-line `origin + t * direction`, `t >= 0`, touch the box?
    pub fn intersects_ray(&self, origin: Vec3, direction: Vec3) -> bool {
        self.clip_line(origin, direction, 0.0, f32::MAX).is_some()
    }

    /// Does the segment `origin .. origin + delta` touch the box?
    pub fn intersects_segment(&self, origin: Vec3, delta: Vec3) -> bool {
        self.clip_line(origin, delta, 0.0, 1.0).is_some()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO)
    }
}
