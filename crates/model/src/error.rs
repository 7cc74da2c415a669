use geom_tessellation::TriangulationError;

use crate::scene::ObjectId;

/// Errors from building objects and querying a scene.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("object {0:?} is not in the scene")]
    UnknownObject(ObjectId),

    #[error("world transform of object {0:?} cannot be inverted")]
    SingularTransform(ObjectId),

    #[error("face {face} references vertex {index} but the object has {vertex_count} vertices")]
    VertexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },

    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
}

pub type Result<T> = std::result::Result<T, SceneError>;
