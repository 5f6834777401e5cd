//! Compound multishape made of rigidly attached convex children.

use glam::{Mat3, Vec3};

use super::aabb::Aabb;
use super::shape::{ConvexShape, SupportMap};
use crate::CollisionError;

/// One convex child placed in the compound's local frame.
#[derive(Debug, Clone)]
pub struct CompoundChild {
    pub shape: ConvexShape,
    pub position: Vec3,
    pub orientation: Mat3,
    bounds: Aabb,
}

impl CompoundChild {
    pub fn new(shape: ConvexShape, position: Vec3, orientation: Mat3) -> Self {
        let bounds = shape.compute_aabb(position, &orientation);
        Self {
            shape,
            position,
            orientation,
            bounds,
        }
    }

    pub fn local_aabb(&self) -> Aabb {
        self.bounds
    }
}

impl SupportMap for CompoundChild {
    fn local_support(&self, direction: Vec3) -> Vec3 {
        super::shape::support_transformed(&self.shape, &self.orientation, self.position, direction)
    }

    fn support_center(&self) -> Vec3 {
        self.orientation * self.shape.support_center() + self.position
    }
}

#[derive(Debug, Clone)]
pub struct CompoundShape {
    children: Vec<CompoundChild>,
    local_aabb: Aabb,
}

impl CompoundShape {
    pub fn new(children: Vec<CompoundChild>) -> Result<Self, CollisionError> {
        if children.is_empty() {
            return Err(CollisionError::EmptyCompound);
        }
        let local_aabb = children
            .iter()
            .fold(Aabb::EMPTY, |acc, c| acc.merged(&c.bounds));
        Ok(Self {
            children,
            local_aabb,
        })
    }

    pub fn children(&self) -> &[CompoundChild] {
        &self.children
    }

    pub fn child(&self, id: usize) -> &CompoundChild {
        &self.children[id]
    }

    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }

    pub fn collect_children(&self, region: &Aabb, out: &mut Vec<usize>) -> usize {
        let before = out.len();
        out.extend(
            self.children
                .iter()
                .enumerate()
                .filter(|(_, c)| c.bounds.overlaps(region))
                .map(|(i, _)| i),
        );
        out.len() - before
    }

    /// Children whose bounds touch the segment `origin .. origin + direction`.
    pub fn collect_children_along_ray(&self, origin: Vec3, direction: Vec3, out: &mut Vec<usize>) -> usize {
        let before = out.len();
        out.extend(
            self.children
                .iter()
                .enumerate()
                .filter(|(_, c)| c.bounds.intersects_segment(origin, direction))
                .map(|(i, _)| i),
        );
        out.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dumbbell() -> CompoundShape {
        CompoundShape::new(vec![
            CompoundChild::new(
                ConvexShape::Sphere { radius: 1.0 },
                Vec3::new(-3.0, 0.0, 0.0),
                Mat3::IDENTITY,
            ),
            CompoundChild::new(
                ConvexShape::Sphere { radius: 1.0 },
                Vec3::new(3.0, 0.0, 0.0),
                Mat3::IDENTITY,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_bounds_cover_children() {
        let shape = dumbbell();
        let eps = 1e-5;
        assert!((shape.local_aabb().min - Vec3::new(-4.0, -1.0, -1.0)).length() < eps);
        assert!((shape.local_aabb().max - Vec3::new(4.0, 1.0, 1.0)).length() < eps);
    }

    #[test]
    fn test_child_support_is_offset() {
        let shape = dumbbell();
        let eps = 1e-5;
        let s = shape.child(1).local_support(Vec3::X);
        assert!((s - Vec3::new(4.0, 0.0, 0.0)).length() < eps);
        assert!((shape.child(0).support_center() - Vec3::new(-3.0, 0.0, 0.0)).length() < eps);
    }

    #[test]
    fn test_collect_children() {
        let shape = dumbbell();
        let mut ids = Vec::new();
        let region = Aabb::new(Vec3::new(2.5, -0.5, -0.5), Vec3::new(5.0, 0.5, 0.5));
        assert_eq!(shape.collect_children(&region, &mut ids), 1);
        assert_eq!(ids, vec![1]);

        ids.clear();
        let gap = Aabb::new(Vec3::new(-1.0, -0.5, -0.5), Vec3::new(1.0, 0.5, 0.5));
        assert_eq!(shape.collect_children(&gap, &mut ids), 0);
    }

    #[test]
    fn test_empty_compound_rejected() {
        assert!(matches!(
            CompoundShape::new(Vec::new()),
            Err(CollisionError::EmptyCompound)
        ));
    }
}
