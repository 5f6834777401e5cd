//! Triangle sub-shape shared by terrains and triangle meshes.

use glam::Vec3;

use super::aabb::Aabb;
use super::shape::SupportMap;

/// Default spherical expansion applied to triangle sub-shapes so the
/// narrowphase sees a thin volume instead of a flat face.
pub const DEFAULT_TRIANGLE_EXPANSION: f32 = 0.05;

/// A single triangle in multishape-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    /// Unit face normal following the counter-clockwise winding.
    pub normal: Vec3,
    pub expansion: f32,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3, expansion: f32) -> Self {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Self {
            vertices: [a, b, c],
            normal,
            expansion,
        }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
    }

    /// Bounds including the expansion margin.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(self.vertices).expanded(self.expansion)
    }
}

impl SupportMap for Triangle {
    fn local_support(&self, direction: Vec3) -> Vec3 {
        let mut best = self.vertices[0];
        let mut best_dot = best.dot(direction);
        for v in &self.vertices[1..] {
            let d = v.dot(direction);
            if d > best_dot {
                best_dot = d;
                best = *v;
            }
        }
        best + direction.normalize_or_zero() * self.expansion
    }

    fn support_center(&self) -> Vec3 {
        self.centroid()
    }
}
