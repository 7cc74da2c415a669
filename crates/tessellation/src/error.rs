/// Errors from shape flattening and triangulation.
///
/// All of these are fatal for the call that produced them: a triangulation
/// that failed part-way is never returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriangulationError {
    #[error("flatness must be finite and positive, got {0}")]
    InvalidFlatness(f64),

    #[error("path segment {segment} draws before any move-to")]
    MissingMoveTo { segment: usize },

    #[error("path segment {segment} has a non-finite coordinate")]
    NonFiniteCoordinate { segment: usize },

    #[error("tessellation normal has no component out of the outline plane")]
    DegenerateNormal,

    #[error("tessellation failed: {0}")]
    Tessellation(String),

    #[error("primitive references vertex {index} but only {vertex_count} vertices exist")]
    VertexOutOfRange { index: usize, vertex_count: usize },
}

pub type Result<T> = std::result::Result<T, TriangulationError>;
