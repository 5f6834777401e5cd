//! Convex shapes and the support-mapping abstraction the narrowphase runs on.

use std::sync::Arc;

use glam::{Mat3, Vec3};

use super::aabb::Aabb;
use super::multishape::Multishape;
use crate::CollisionError;

/// A convex volume described by its support function.
pub trait SupportMap {
    /// Farthest point of the shape along `direction`, in local space.
    /// `direction` need not be normalized.
    fn local_support(&self, direction: Vec3) -> Vec3;

    /// A point strictly inside the shape, in local space.
    fn support_center(&self) -> Vec3 {
        Vec3::ZERO
    }
}

/// World-space support point of `shape` placed at `position` with rotation
/// `orientation`.
#[inline]
pub fn support_transformed<S: SupportMap + ?Sized>(
    shape: &S,
    orientation: &Mat3,
    position: Vec3,
    direction: Vec3,
) -> Vec3 {
    let local_dir = orientation.transpose() * direction;
    *orientation * shape.local_support(local_dir) + position
}

/// Convex point cloud. The support point is the cloud point with the largest
/// projection; the centroid serves as interior point.
#[derive(Debug, Clone)]
pub struct ConvexHull {
    points: Arc<[Vec3]>,
    centroid: Vec3,
}

impl ConvexHull {
    pub fn new(points: impl Into<Arc<[Vec3]>>) -> Result<Self, CollisionError> {
        let points = points.into();
        if points.is_empty() {
            return Err(CollisionError::EmptyConvexHull);
        }
        let centroid = points.iter().copied().sum::<Vec3>() / points.len() as f32;
        Ok(Self { points, centroid })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}

/// Primitive convex shapes. Capsule, cylinder and cone are aligned with the
/// local Y axis.
#[derive(Debug, Clone)]
pub enum ConvexShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    Capsule { radius: f32, half_height: f32 },
    Cylinder { radius: f32, half_height: f32 },
    /// Base disc at `-height / 2`, apex at `+height / 2`.
    Cone { radius: f32, height: f32 },
    ConvexHull(ConvexHull),
}

impl ConvexShape {
    /// Tight world-space bounds from six support queries.
    pub fn compute_aabb(&self, position: Vec3, orientation: &Mat3) -> Aabb {
        let mut min = Vec3::ZERO;
        let mut max = Vec3::ZERO;
        for axis in 0..3 {
            let mut dir = Vec3::ZERO;
            dir[axis] = 1.0;
            max[axis] = support_transformed(self, orientation, position, dir)[axis];
            min[axis] = support_transformed(self, orientation, position, -dir)[axis];
        }
        Aabb { min, max }
    }
}

impl SupportMap for ConvexShape {
    #[inline]
    fn local_support(&self, direction: Vec3) -> Vec3 {
        let dir = direction.normalize_or_zero();
        match self {
            ConvexShape::Sphere { radius } => dir * *radius,
            ConvexShape::Box { half_extents } => Vec3::new(
                if dir.x >= 0.0 {
                    half_extents.x
                } else {
                    -half_extents.x
                },
                if dir.y >= 0.0 {
                    half_extents.y
                } else {
                    -half_extents.y
                },
                if dir.z >= 0.0 {
                    half_extents.z
                } else {
                    -half_extents.z
                },
            ),
            ConvexShape::Capsule {
                radius,
                half_height,
            } => {
                let tip = if dir.y >= 0.0 {
                    *half_height
                } else {
                    -*half_height
                };
                Vec3::new(0.0, tip, 0.0) + dir * *radius
            }
            ConvexShape::Cylinder {
                radius,
                half_height,
            } => {
                let y = if dir.y >= 0.0 {
                    *half_height
                } else {
                    -*half_height
                };
                let rim = disc_support(dir, *radius);
                Vec3::new(rim.x, y, rim.z)
            }
            ConvexShape::Cone { radius, height } => {
                let half = *height * 0.5;
                let sin_apex = *radius / (radius * radius + height * height).sqrt();
                if dir.y > sin_apex {
                    Vec3::new(0.0, half, 0.0)
                } else {
                    let rim = disc_support(dir, *radius);
                    Vec3::new(rim.x, -half, rim.z)
                }
            }
            ConvexShape::ConvexHull(hull) => {
                let mut best = hull.points[0];
                let mut best_dot = best.dot(direction);
                for p in &hull.points[1..] {
                    let d = p.dot(direction);
                    if d > best_dot {
                        best_dot = d;
                        best = *p;
                    }
                }
                best
            }
        }
    }

    fn support_center(&self) -> Vec3 {
        match self {
            ConvexShape::ConvexHull(hull) => hull.centroid,
            _ => Vec3::ZERO,
        }
    }
}

/// Support of a disc of `radius` in the local XZ plane.
#[inline]
fn disc_support(dir: Vec3, radius: f32) -> Vec3 {
    let xz = Vec3::new(dir.x, 0.0, dir.z);
    let len = xz.length();
    if len > 1e-6 {
        xz * (radius / len)
    } else {
        Vec3::ZERO
    }
}

/// Collision shape of a body: either a single convex volume or a multishape
/// that has to be queried region by region.
#[derive(Debug, Clone)]
pub enum Shape {
    Convex(ConvexShape),
    Multi(Multishape),
}

impl Shape {
    pub fn sphere(radius: f32) -> Self {
        Shape::Convex(ConvexShape::Sphere { radius })
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Shape::Convex(ConvexShape::Box { half_extents })
    }

    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Shape::Convex(ConvexShape::Capsule {
            radius,
            half_height,
        })
    }

    pub fn cylinder(radius: f32, half_height: f32) -> Self {
        Shape::Convex(ConvexShape::Cylinder {
            radius,
            half_height,
        })
    }

    pub fn cone(radius: f32, height: f32) -> Self {
        Shape::Convex(ConvexShape::Cone { radius, height })
    }

    pub fn convex_hull(points: impl Into<Arc<[Vec3]>>) -> Result<Self, CollisionError> {
        Ok(Shape::Convex(ConvexShape::ConvexHull(ConvexHull::new(points)?)))
    }

    pub fn is_multishape(&self) -> bool {
        matches!(self, Shape::Multi(_))
    }

    /// World-space bounds for the shape at the given placement.
    pub fn compute_aabb(&self, position: Vec3, orientation: &Mat3) -> Aabb {
        match self {
            Shape::Convex(convex) => convex.compute_aabb(position, orientation),
            Shape::Multi(multi) => multi.local_aabb().transformed(position, orientation),
        }
    }
}

impl From<ConvexShape> for Shape {
    fn from(shape: ConvexShape) -> Self {
        Shape::Convex(shape)
    }
}

impl From<Multishape> for Shape {
    fn from(shape: Multishape) -> Self {
        Shape::Multi(shape)
    }
}
