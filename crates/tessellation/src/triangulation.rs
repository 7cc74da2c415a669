use std::borrow::Cow;
use std::sync::Arc;

use geom_kernel::{Point3d, Transform};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriangulationError};
use crate::primitive::{TessellationPrimitive, TriangleList};
use crate::tessellation::BasicTessellation;

/// Result of triangulating an outline: vertices, triangles indexing into them,
/// and one index loop per flattened contour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Triangulation {
    vertices: Vec<Point3d>,
    triangles: Vec<[usize; 3]>,
    outlines: Vec<Vec<usize>>,
}

impl Triangulation {
    pub fn new(vertices: Vec<Point3d>, triangles: Vec<[usize; 3]>, outlines: Vec<Vec<usize>>) -> Result<Self> {
        let vertex_count = vertices.len();
        for &index in triangles.iter().flatten().chain(outlines.iter().flatten()) {
            if index >= vertex_count {
                return Err(TriangulationError::VertexOutOfRange { index, vertex_count });
            }
        }
        Ok(Self {
            vertices,
            triangles,
            outlines,
        })
    }

    pub fn vertices(&self) -> &[Point3d] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn outlines(&self) -> &[Vec<usize>] {
        &self.outlines
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Vertices mapped through `transform`; borrowed unchanged for the identity.
    pub fn transformed_vertices(&self, transform: &Transform) -> Cow<'_, [Point3d]> {
        if transform.is_identity() {
            Cow::Borrowed(&self.vertices)
        } else {
            Cow::Owned(self.vertices.iter().map(|p| transform.transform_point(p)).collect())
        }
    }

    pub fn triangle_points(&self, triangle: usize) -> Option<[Point3d; 3]> {
        let [a, b, c] = *self.triangles.get(triangle)?;
        Some([self.vertices[a], self.vertices[b], self.vertices[c]])
    }

    /// Sum of the (unsigned) triangle areas.
    pub fn area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let (a, b, c) = (self.vertices[a], self.vertices[b], self.vertices[c]);
                (b - a).cross(&(c - a)).length() * 0.5
            })
            .sum()
    }

    /// Repackage as a tessellation holding a single triangle-list primitive.
    pub fn into_tessellation(self) -> BasicTessellation {
        let primitives: Vec<Arc<dyn TessellationPrimitive>> = if self.triangles.is_empty() {
            Vec::new()
        } else {
            vec![Arc::new(TriangleList::from_triangles(&self.triangles))]
        };
        BasicTessellation::from_validated(self.vertices, self.outlines, primitives)
    }
}
