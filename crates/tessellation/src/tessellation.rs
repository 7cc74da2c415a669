use std::sync::Arc;

use geom_kernel::Point3d;

use crate::error::{Result, TriangulationError};
use crate::primitive::TessellationPrimitive;

/// Vertices plus the primitives and outlines that index into them.
#[derive(Debug, Clone, Default)]
pub struct BasicTessellation {
    vertices: Vec<Point3d>,
    outlines: Vec<Vec<usize>>,
    primitives: Vec<Arc<dyn TessellationPrimitive>>,
}

impl BasicTessellation {
    /// Fails if any outline or primitive refers past the end of `vertices`.
    pub fn new(
        vertices: Vec<Point3d>,
        outlines: Vec<Vec<usize>>,
        primitives: Vec<Arc<dyn TessellationPrimitive>>,
    ) -> Result<Self> {
        let vertex_count = vertices.len();
        let indices = outlines
            .iter()
            .flatten()
            .chain(primitives.iter().flat_map(|p| p.vertices()));
        for &index in indices {
            if index >= vertex_count {
                return Err(TriangulationError::VertexOutOfRange { index, vertex_count });
            }
        }
        Ok(Self {
            vertices,
            outlines,
            primitives,
        })
    }

    /// Caller guarantees every index is in range.
    pub(crate) fn from_validated(
        vertices: Vec<Point3d>,
        outlines: Vec<Vec<usize>>,
        primitives: Vec<Arc<dyn TessellationPrimitive>>,
    ) -> Self {
        Self {
            vertices,
            outlines,
            primitives,
        }
    }

    pub fn vertices(&self) -> &[Point3d] {
        &self.vertices
    }

    pub fn outlines(&self) -> &[Vec<usize>] {
        &self.outlines
    }

    pub fn primitives(&self) -> &[Arc<dyn TessellationPrimitive>] {
        &self.primitives
    }

    /// All primitives' triangles, in primitive order.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        self.primitives
            .iter()
            .flat_map(|p| p.triangles().iter().copied())
            .collect()
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(|p| p.triangles().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{TriangleFan, TriangleStrip};

    fn square() -> Vec<Point3d> {
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_triangles_concatenate_primitives() {
        let tess = BasicTessellation::new(
            square(),
            vec![vec![0, 1, 2, 3]],
            vec![
                Arc::new(TriangleFan::new(vec![0, 1, 2, 3])),
                Arc::new(TriangleStrip::new(vec![0, 1, 2])),
            ],
        )
        .unwrap();
        assert_eq!(tess.triangles(), vec![[0, 1, 2], [0, 2, 3], [0, 1, 2]]);
        assert_eq!(tess.triangle_count(), 3);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let err = BasicTessellation::new(square(), vec![], vec![Arc::new(TriangleFan::new(vec![0, 1, 4]))])
            .unwrap_err();
        assert_eq!(
            err,
            TriangulationError::VertexOutOfRange {
                index: 4,
                vertex_count: 4
            }
        );

        let err = BasicTessellation::new(square(), vec![vec![0, 9]], vec![]).unwrap_err();
        assert!(matches!(err, TriangulationError::VertexOutOfRange { index: 9, .. }));
    }
}
