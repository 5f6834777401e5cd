//! Error type for the collision subsystem.
//!
//! Only contract violations and malformed input surface as errors. A pair
//! that does not intersect, a ray that misses or an empty multishape query
//! are ordinary results expressed through `Option`/`bool`.

use hecs::Entity;

/// Errors produced by collision systems and shape constructors.
#[derive(Debug, thiserror::Error)]
pub enum CollisionError {
    /// `add_body` was called for an entity that is already registered.
    #[error("body {0:?} is already registered in this collision system")]
    AlreadyRegistered(Entity),

    /// A registered entity is missing one of the components detection reads.
    #[error("body {entity:?} cannot be read from the world")]
    BodyUnavailable {
        entity: Entity,
        #[source]
        source: hecs::ComponentError,
    },

    /// The worker pool could not be created.
    #[error("failed to build collision task pool")]
    TaskPool(#[from] rayon::ThreadPoolBuildError),

    /// A height field needs at least a 2x2 grid of samples.
    #[error("terrain needs at least 2x2 samples, got {columns}x{rows}")]
    TerrainTooSmall { columns: usize, rows: usize },

    /// The number of height samples does not match `columns * rows`.
    #[error("terrain expects {expected} height samples, got {actual}")]
    TerrainSampleCount { expected: usize, actual: usize },

    /// Grid spacing must be strictly positive and finite.
    #[error("terrain cell size must be positive, got ({scale_x}, {scale_z})")]
    TerrainScale { scale_x: f32, scale_z: f32 },

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, mesh has {vertex_count} vertices")]
    MeshIndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    /// A triangle mesh without triangles.
    #[error("triangle mesh has no triangles")]
    EmptyMesh,

    /// A convex hull needs at least one point.
    #[error("convex hull has no points")]
    EmptyConvexHull,

    /// A compound shape needs at least one child.
    #[error("compound shape has no children")]
    EmptyCompound,
}
