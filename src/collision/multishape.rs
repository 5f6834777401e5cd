//! Multishapes: composite surfaces queried one convex sub-shape at a time.
//!
//! A [`Multishape`] only holds immutable geometry behind an `Arc`. Region
//! queries run on a [`WorkingClone`] obtained from
//! [`Multishape::request_working_clone`], which owns the prepared sub-shape
//! list and the current selection. Every detection or raycast task takes its
//! own clone, so concurrent queries against one multishape never share
//! mutable state. Dropping the clone returns it.

use std::sync::Arc;

use glam::Vec3;

use super::aabb::Aabb;
use super::compound::CompoundShape;
use super::shape::SupportMap;
use super::terrain::TerrainShape;
use super::triangle::Triangle;
use super::trimesh::TriangleMeshShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultishapeKind {
    Terrain,
    TriangleMesh,
    Compound,
}

#[derive(Debug, Clone)]
pub enum Multishape {
    Terrain(Arc<TerrainShape>),
    TriangleMesh(Arc<TriangleMeshShape>),
    Compound(Arc<CompoundShape>),
}

impl Multishape {
    pub fn kind(&self) -> MultishapeKind {
        match self {
            Multishape::Terrain(_) => MultishapeKind::Terrain,
            Multishape::TriangleMesh(_) => MultishapeKind::TriangleMesh,
            Multishape::Compound(_) => MultishapeKind::Compound,
        }
    }

    /// Bounds of the whole multishape in its local frame.
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Multishape::Terrain(t) => t.local_aabb(),
            Multishape::TriangleMesh(m) => m.local_aabb(),
            Multishape::Compound(c) => c.local_aabb(),
        }
    }

    /// Task-local query state sharing this multishape's geometry.
    pub fn request_working_clone(&self) -> WorkingClone {
        WorkingClone {
            shape: self.clone(),
            prepared: Vec::new(),
            current: Current::None,
        }
    }
}

impl From<TerrainShape> for Multishape {
    fn from(shape: TerrainShape) -> Self {
        Multishape::Terrain(Arc::new(shape))
    }
}

impl From<TriangleMeshShape> for Multishape {
    fn from(shape: TriangleMeshShape) -> Self {
        Multishape::TriangleMesh(Arc::new(shape))
    }
}

impl From<CompoundShape> for Multishape {
    fn from(shape: CompoundShape) -> Self {
        Multishape::Compound(Arc::new(shape))
    }
}

#[derive(Debug, Clone, Copy)]
enum Current {
    None,
    Triangle(Triangle),
    Child(usize),
}

/// Prepared query over one multishape.
///
/// `prepare*` fills the list of candidate sub-shapes, `set_current_shape`
/// selects one of them and the [`SupportMap`] impl then resolves against the
/// selected sub-shape.
#[derive(Debug)]
pub struct WorkingClone {
    shape: Multishape,
    prepared: Vec<usize>,
    current: Current,
}

impl WorkingClone {
    pub fn kind(&self) -> MultishapeKind {
        self.shape.kind()
    }

    /// Collect the sub-shapes overlapping `region` (multishape-local) and
    /// return how many there are.
    pub fn prepare(&mut self, region: &Aabb) -> usize {
        self.prepared.clear();
        self.current = Current::None;
        match &self.shape {
            Multishape::Terrain(t) => t.collect_triangles(region, &mut self.prepared),
            Multishape::TriangleMesh(m) => m.collect_triangles(region, &mut self.prepared),
            Multishape::Compound(c) => c.collect_children(region, &mut self.prepared),
        }
    }

    /// Collect the sub-shapes the local segment `origin .. origin + direction`
    /// may hit. Scale `direction` to the length of the query.
    pub fn prepare_ray(&mut self, origin: Vec3, direction: Vec3) -> usize {
        self.prepared.clear();
        self.current = Current::None;
        match &self.shape {
            Multishape::Terrain(t) => {
                t.collect_triangles_along_ray(origin, direction, &mut self.prepared)
            }
            Multishape::TriangleMesh(m) => {
                m.collect_triangles_along_ray(origin, direction, &mut self.prepared)
            }
            Multishape::Compound(c) => {
                c.collect_children_along_ray(origin, direction, &mut self.prepared)
            }
        }
    }

    pub fn prepared_count(&self) -> usize {
        self.prepared.len()
    }

    /// Sub-shape ids found by the last `prepare*` call.
    pub fn prepared(&self) -> &[usize] {
        &self.prepared
    }

    /// Select the `index`-th prepared sub-shape.
    ///
    /// # Panics
    ///
    /// If `index >= prepared_count()`.
    pub fn set_current_shape(&mut self, index: usize) {
        let id = self.prepared[index];
        self.current = match &self.shape {
            Multishape::Terrain(t) => Current::Triangle(t.triangle(id)),
            Multishape::TriangleMesh(m) => Current::Triangle(m.triangle(id)),
            Multishape::Compound(_) => Current::Child(id),
        };
    }

    /// Face normal of the selected triangle pointing into the surface, in
    /// multishape-local space. `None` for compounds or when nothing is
    /// selected.
    pub fn collision_normal(&self) -> Option<Vec3> {
        match self.current {
            Current::Triangle(tri) => Some(-tri.normal),
            _ => None,
        }
    }
}

impl SupportMap for WorkingClone {
    fn local_support(&self, direction: Vec3) -> Vec3 {
        match (&self.current, &self.shape) {
            (Current::Triangle(tri), _) => tri.local_support(direction),
            (Current::Child(id), Multishape::Compound(c)) => c.child(*id).local_support(direction),
            _ => Vec3::ZERO,
        }
    }

    fn support_center(&self) -> Vec3 {
        match (&self.current, &self.shape) {
            (Current::Triangle(tri), _) => tri.support_center(),
            (Current::Child(id), Multishape::Compound(c)) => c.child(*id).support_center(),
            _ => Vec3::ZERO,
        }
    }
}
