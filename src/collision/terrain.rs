//! Height-field terrain multishape.
//!
//! Samples form a regular grid in the local XZ plane starting at the origin.
//! Each grid cell is split into two triangles; triangle ids are
//! `cell * 2 + k` with `cell = z * (columns - 1) + x`.

use glam::Vec3;

use super::aabb::Aabb;
use super::triangle::{Triangle, DEFAULT_TRIANGLE_EXPANSION};
use crate::CollisionError;

#[derive(Debug, Clone)]
pub struct TerrainShape {
    heights: Vec<f32>,
    columns: usize,
    rows: usize,
    scale_x: f32,
    scale_z: f32,
    expansion: f32,
    bounds: Aabb,
}

impl TerrainShape {
    /// Build a terrain from row-major samples: `heights[z * columns + x]`.
    pub fn new(
        heights: Vec<f32>,
        columns: usize,
        rows: usize,
        scale_x: f32,
        scale_z: f32,
    ) -> Result<Self, CollisionError> {
        if columns < 2 || rows < 2 {
            return Err(CollisionError::TerrainTooSmall { columns, rows });
        }
        if heights.len() != columns * rows {
            return Err(CollisionError::TerrainSampleCount {
                expected: columns * rows,
                actual: heights.len(),
            });
        }
        if !(scale_x > 0.0 && scale_z > 0.0 && scale_x.is_finite() && scale_z.is_finite()) {
            return Err(CollisionError::TerrainScale { scale_x, scale_z });
        }

        let (min_h, max_h) = heights
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)));
        let expansion = DEFAULT_TRIANGLE_EXPANSION;
        let bounds = Aabb::new(
            Vec3::new(0.0, min_h, 0.0),
            Vec3::new(
                (columns - 1) as f32 * scale_x,
                max_h,
                (rows - 1) as f32 * scale_z,
            ),
        )
        .expanded(expansion);

        Ok(Self {
            heights,
            columns,
            rows,
            scale_x,
            scale_z,
            expansion,
            bounds,
        })
    }

    /// Flat terrain, handy for ground planes.
    pub fn flat(columns: usize, rows: usize, cell_size: f32) -> Result<Self, CollisionError> {
        Self::new(vec![0.0; columns * rows], columns, rows, cell_size, cell_size)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn height(&self, x: usize, z: usize) -> f32 {
        self.heights[z * self.columns + x]
    }

    pub fn local_aabb(&self) -> Aabb {
        self.bounds
    }

    fn vertex(&self, x: usize, z: usize) -> Vec3 {
        Vec3::new(
            x as f32 * self.scale_x,
            self.height(x, z),
            z as f32 * self.scale_z,
        )
    }

    /// Triangle with the given id, in terrain-local space.
    pub fn triangle(&self, id: usize) -> Triangle {
        let cell = id / 2;
        let x = cell % (self.columns - 1);
        let z = cell / (self.columns - 1);
        let p00 = self.vertex(x, z);
        let p10 = self.vertex(x + 1, z);
        let p01 = self.vertex(x, z + 1);
        let p11 = self.vertex(x + 1, z + 1);
        if id % 2 == 0 {
            Triangle::new(p00, p01, p10, self.expansion)
        } else {
            Triangle::new(p10, p01, p11, self.expansion)
        }
    }

    /// Cell index range `[lo, hi]` along one grid axis covered by `[min, max]`.
    fn cell_range(min: f32, max: f32, scale: f32, cells: usize) -> Option<(usize, usize)> {
        let extent = cells as f32 * scale;
        if max < 0.0 || min > extent {
            return None;
        }
        let last = cells - 1;
        let lo = ((min / scale).floor().max(0.0) as usize).min(last);
        let hi = ((max / scale).floor().max(0.0) as usize).min(last);
        Some((lo, hi))
    }

    /// Push the ids of all triangles whose cells may touch `region` and
    /// return how many were added.
    pub fn collect_triangles(&self, region: &Aabb, out: &mut Vec<usize>) -> usize {
        let before = out.len();
        let region = region.expanded(self.expansion);
        let cells_x = self.columns - 1;
        let cells_z = self.rows - 1;
        let (Some((x0, x1)), Some((z0, z1))) = (
            Self::cell_range(region.min.x, region.max.x, self.scale_x, cells_x),
            Self::cell_range(region.min.z, region.max.z, self.scale_z, cells_z),
        ) else {
            return 0;
        };

        for z in z0..=z1 {
            for x in x0..=x1 {
                let h = [
                    self.height(x, z),
                    self.height(x + 1, z),
                    self.height(x, z + 1),
                    self.height(x + 1, z + 1),
                ];
                let lo = h.iter().copied().fold(f32::MAX, f32::min);
                let hi = h.iter().copied().fold(f32::MIN, f32::max);
                if hi < region.min.y || lo > region.max.y {
                    continue;
                }
                let cell = z * cells_x + x;
                out.push(cell * 2);
                out.push(cell * 2 + 1);
            }
        }
        out.len() - before
    }

    /// Like [`collect_triangles`](Self::collect_triangles) for the segment
    /// `origin .. origin + direction`, clipped to the terrain bounds.
    pub fn collect_triangles_along_ray(&self, origin: Vec3, direction: Vec3, out: &mut Vec<usize>) -> usize {
        match self.bounds.clip_line(origin, direction, 0.0, 1.0) {
            Some((enter, exit)) => {
                let segment =
                    Aabb::from_segment(origin + direction * enter, origin + direction * exit);
                self.collect_triangles(&segment, out)
            }
            None => 0,
        }
    }
}
