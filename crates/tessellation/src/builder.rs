//! Reassembly of a fan/strip/triangle-list primitive stream into triangles.

use geom_kernel::Point3d;
use tracing::trace;

use crate::error::{Result, TriangulationError};
use crate::primitive::PrimitiveKind;
use crate::triangulation::Triangulation;

/// Listener for the primitive stream a tessellation engine emits.
///
/// Calls arrive as `begin`, any number of `vertex`, then `end`, repeated.
/// `combine` registers a vertex the engine created where edges cross; the
/// returned index may be emitted like any other. `error` may arrive at any
/// point and poisons the whole result.
pub trait TessellationCallback {
    fn begin(&mut self, kind: PrimitiveKind);

    fn vertex(&mut self, index: usize);

    fn combine(&mut self, position: Point3d) -> usize;

    fn end(&mut self);

    fn error(&mut self, message: String);
}

/// Collects triangles from a primitive stream.
///
/// A two-slot buffer holds the vertices the next triangle is built on. For
/// fans the first slot stays fixed; for strips the buffer slides and the
/// winding flips every vertex; for plain triangles it empties after each
/// triangle. Each triangle swaps the buffered pair (`[v1, v0, new]`), or
/// keeps it on odd strip steps, so a primitive emitted counter-clockwise
/// about the normal comes out clockwise. Triangles whose edge cross product
/// is the zero vector are dropped.
#[derive(Debug)]
pub struct TriangulationBuilder {
    vertices: Vec<Point3d>,
    triangles: Vec<[usize; 3]>,
    kind: Option<PrimitiveKind>,
    buffer: [Option<usize>; 2],
    flip: bool,
    error: Option<TriangulationError>,
}

impl TriangulationBuilder {
    pub fn new(vertices: Vec<Point3d>) -> Self {
        Self {
            vertices,
            triangles: Vec::new(),
            kind: None,
            buffer: [None, None],
            flip: false,
            error: None,
        }
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Fails with the first error reported to or detected by the builder.
    pub fn finish(self, outlines: Vec<Vec<usize>>) -> Result<Triangulation> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Triangulation::new(self.vertices, self.triangles, outlines)
    }

    fn fail(&mut self, error: TriangulationError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn push_triangle(&mut self, triangle: [usize; 3]) {
        let [a, b, c] = triangle.map(|i| self.vertices[i]);
        if (b - a).cross(&(c - a)).is_zero() {
            trace!(?triangle, "dropping collinear triangle");
            return;
        }
        self.triangles.push(triangle);
    }
}

impl TessellationCallback for TriangulationBuilder {
    fn begin(&mut self, kind: PrimitiveKind) {
        self.kind = Some(kind);
        self.buffer = [None, None];
        self.flip = false;
    }

    fn vertex(&mut self, index: usize) {
        if self.error.is_some() {
            return;
        }
        if index >= self.vertices.len() {
            let vertex_count = self.vertices.len();
            self.fail(TriangulationError::VertexOutOfRange { index, vertex_count });
            return;
        }
        let Some(kind) = self.kind else {
            self.fail(TriangulationError::Tessellation(format!(
                "vertex {index} emitted outside a primitive"
            )));
            return;
        };

        match self.buffer {
            [Some(v0), Some(v1)] => {
                let triangle = if self.flip { [v0, v1, index] } else { [v1, v0, index] };
                self.push_triangle(triangle);
                match kind {
                    PrimitiveKind::Fan => self.buffer[1] = Some(index),
                    PrimitiveKind::Strip => {
                        self.buffer = [Some(v1), Some(index)];
                        self.flip = !self.flip;
                    }
                    PrimitiveKind::Triangles => self.buffer = [None, None],
                }
            }
            [None, _] => self.buffer[0] = Some(index),
            [Some(_), None] => self.buffer[1] = Some(index),
        }
    }

    fn combine(&mut self, position: Point3d) -> usize {
        self.vertices.push(position);
        trace!(index = self.vertices.len() - 1, ?position, "combined vertex");
        self.vertices.len() - 1
    }

    fn end(&mut self) {
        self.kind = None;
        self.buffer = [None, None];
        self.flip = false;
    }

    fn error(&mut self, message: String) {
        self.fail(TriangulationError::Tessellation(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Point3d> {
        // 0 2 4
        // 1 3 5
        vec![
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(2.0, 1.0, 0.0),
            Point3d::new(2.0, 0.0, 0.0),
        ]
    }

    fn emit(builder: &mut TriangulationBuilder, kind: PrimitiveKind, indices: &[usize]) {
        builder.begin(kind);
        for &i in indices {
            builder.vertex(i);
        }
        builder.end();
    }

    fn signed_z(vertices: &[Point3d], [a, b, c]: [usize; 3]) -> f64 {
        (vertices[b] - vertices[a]).cross(&(vertices[c] - vertices[a])).z
    }

    #[test]
    fn test_fan_reassembly() {
        let mut builder = TriangulationBuilder::new(grid());
        emit(&mut builder, PrimitiveKind::Fan, &[1, 3, 2, 0]);
        assert_eq!(builder.triangles(), &[[3, 1, 2], [2, 1, 0]]);
    }

    #[test]
    fn test_strip_keeps_consistent_winding() {
        let vertices = grid();
        let mut builder = TriangulationBuilder::new(vertices.clone());
        emit(&mut builder, PrimitiveKind::Strip, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(builder.triangles(), &[[1, 0, 2], [1, 2, 3], [3, 2, 4], [3, 4, 5]]);
        // The grid is laid out so the strip runs clockwise about +z.
        for &t in builder.triangles() {
            assert!(signed_z(&vertices, t) < 0.0, "{t:?}");
        }
    }

    #[test]
    fn test_triangle_list_reassembly() {
        let mut builder = TriangulationBuilder::new(grid());
        emit(&mut builder, PrimitiveKind::Triangles, &[0, 1, 2, 2, 1, 3, 4]);
        assert_eq!(builder.triangles(), &[[1, 0, 2], [1, 2, 3]]);
    }

    #[test]
    fn test_collinear_triangles_dropped() {
        let vertices = vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(2.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
        ];
        let mut builder = TriangulationBuilder::new(vertices);
        emit(&mut builder, PrimitiveKind::Fan, &[0, 1, 2, 3]);
        assert_eq!(builder.triangles(), &[[2, 0, 3]]);
    }

    #[test]
    fn test_fan_reverses_counter_clockwise_input() {
        let vertices = grid();
        let mut builder = TriangulationBuilder::new(vertices.clone());
        // 1 -> 3 -> 2 -> 0 walks the unit square counter-clockwise.
        emit(&mut builder, PrimitiveKind::Fan, &[1, 3, 2, 0]);
        assert!(builder.triangles().iter().all(|&t| signed_z(&vertices, t) < 0.0));
    }

    #[test]
    fn test_combined_vertices_are_appended() {
        let mut builder = TriangulationBuilder::new(grid());
        let crossing = builder.combine(Point3d::new(0.5, 0.5, 0.0));
        assert_eq!(crossing, 6);
        emit(&mut builder, PrimitiveKind::Triangles, &[crossing, 1, 3]);
        assert_eq!(builder.triangles(), &[[1, 6, 3]]);
        let tri = builder.finish(vec![]).unwrap();
        assert_eq!(tri.vertices().len(), 7);
    }

    #[test]
    fn test_error_is_fatal() {
        let mut builder = TriangulationBuilder::new(grid());
        emit(&mut builder, PrimitiveKind::Triangles, &[0, 1, 2]);
        builder.error("engine gave up".to_string());
        let err = builder.finish(vec![]).unwrap_err();
        assert_eq!(err, TriangulationError::Tessellation("engine gave up".to_string()));
    }

    #[test]
    fn test_vertex_out_of_range_is_fatal() {
        let mut builder = TriangulationBuilder::new(grid());
        emit(&mut builder, PrimitiveKind::Triangles, &[0, 1, 6]);
        assert!(matches!(
            builder.finish(vec![]),
            Err(TriangulationError::VertexOutOfRange { index: 6, vertex_count: 6 })
        ));
    }

    #[test]
    fn test_vertex_outside_primitive_is_fatal() {
        let mut builder = TriangulationBuilder::new(grid());
        builder.vertex(0);
        assert!(matches!(builder.finish(vec![]), Err(TriangulationError::Tessellation(_))));
    }
}
