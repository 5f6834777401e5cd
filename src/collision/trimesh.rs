//! Indexed triangle mesh multishape.

use glam::Vec3;

use super::aabb::Aabb;
use super::triangle::{Triangle, DEFAULT_TRIANGLE_EXPANSION};
use crate::CollisionError;

#[derive(Debug, Clone)]
pub struct TriangleMeshShape {
    triangles: Vec<Triangle>,
    bounds: Vec<Aabb>,
    local_aabb: Aabb,
}

impl TriangleMeshShape {
    /// Build a mesh from vertices and counter-clockwise index triples.
    pub fn new(vertices: &[Vec3], indices: &[[u32; 3]]) -> Result<Self, CollisionError> {
        Self::with_expansion(vertices, indices, DEFAULT_TRIANGLE_EXPANSION)
    }

    pub fn with_expansion(
        vertices: &[Vec3],
        indices: &[[u32; 3]],
        expansion: f32,
    ) -> Result<Self, CollisionError> {
        if indices.is_empty() {
            return Err(CollisionError::EmptyMesh);
        }

        let mut triangles = Vec::with_capacity(indices.len());
        for (triangle, tri) in indices.iter().enumerate() {
            let mut corners = [Vec3::ZERO; 3];
            for (corner, &index) in corners.iter_mut().zip(tri) {
                *corner = *vertices.get(index as usize).ok_or(
                    CollisionError::MeshIndexOutOfRange {
                        triangle,
                        index,
                        vertex_count: vertices.len(),
                    },
                )?;
            }
            triangles.push(Triangle::new(corners[0], corners[1], corners[2], expansion));
        }

        let bounds: Vec<Aabb> = triangles.iter().map(Triangle::aabb).collect();
        let local_aabb = bounds.iter().fold(Aabb::EMPTY, |acc, b| acc.merged(b));

        Ok(Self {
            triangles,
            bounds,
            local_aabb,
        })
    }

    /// Reverse the winding of every triangle, flipping all face normals.
    pub fn flip_normals(mut self) -> Self {
        for tri in &mut self.triangles {
            *tri = Triangle::new(tri.vertices[0], tri.vertices[2], tri.vertices[1], tri.expansion);
        }
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangle(&self, id: usize) -> Triangle {
        self.triangles[id]
    }

    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }

    pub fn collect_triangles(&self, region: &Aabb, out: &mut Vec<usize>) -> usize {
        let before = out.len();
        out.extend(
            self.bounds
                .iter()
                .enumerate()
                .filter(|(_, b)| b.overlaps(region))
                .map(|(i, _)| i),
        );
        out.len() - before
    }

    /// Triangles whose bounds touch the segment `origin .. origin + direction`.
    pub fn collect_triangles_along_ray(&self, origin: Vec3, direction: Vec3, out: &mut Vec<usize>) -> usize {
        let before = out.len();
        out.extend(
            self.bounds
                .iter()
                .enumerate()
                .filter(|(_, b)| b.intersects_segment(origin, direction))
                .map(|(i, _)| i),
        );
        out.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles forming the unit square in the XZ plane plus one
    /// triangle far away.
    fn mesh() -> TriangleMeshShape {
        let vertices = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(11.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, 11.0),
        ];
        let indices = [[0, 2, 1], [1, 2, 3], [4, 6, 5]];
        TriangleMeshShape::new(&vertices, &indices).unwrap()
    }

    #[test]
    fn test_bad_index_rejected() {
        let err = TriangleMeshShape::new(&[Vec3::ZERO], &[[0, 1, 0]]).unwrap_err();
        assert!(matches!(
            err,
            CollisionError::MeshIndexOutOfRange {
                triangle: 0,
                index: 1,
                vertex_count: 1
            }
        ));
        assert!(matches!(
            TriangleMeshShape::new(&[Vec3::ZERO], &[]),
            Err(CollisionError::EmptyMesh)
        ));
    }

    #[test]
    fn test_normals_and_flip() {
        let mesh = mesh();
        assert_eq!(mesh.triangle_count(), 3);
        let eps = 1e-6;
        assert!((mesh.triangle(0).normal - Vec3::Y).length() < eps);
        let flipped = mesh.flip_normals();
        assert_eq!(flipped.triangle_count(), 3);
        assert!((flipped.triangle(0).normal + Vec3::Y).length() < eps);
    }

    #[test]
    fn test_collect_region() {
        let mesh = mesh();
        let mut ids = Vec::new();
        let region = Aabb::new(Vec3::new(0.2, -0.1, 0.2), Vec3::new(0.4, 0.1, 0.4));
        mesh.collect_triangles(&region, &mut ids);
        assert_eq!(ids, vec![0, 1]);

        ids.clear();
        let far = Aabb::new(Vec3::splat(10.2), Vec3::splat(10.4));
        assert_eq!(mesh.collect_triangles(&far, &mut ids), 0);
    }

    #[test]
    fn test_collect_along_ray() {
        let mesh = mesh();
        let mut ids = Vec::new();
        mesh.collect_triangles_along_ray(Vec3::new(10.2, 5.0, 10.2), Vec3::new(0.0, -10.0, 0.0), &mut ids);
        assert_eq!(ids, vec![2]);

        ids.clear();
        mesh.collect_triangles_along_ray(Vec3::new(10.2, 5.0, 10.2), -Vec3::Y, &mut ids);
        assert!(ids.is_empty());
    }
}
