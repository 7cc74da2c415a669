//! Triangulation of 2D outlines into indexed triangle meshes.
//!
//! [`Shape2D`] outlines are flattened into polygon contours, tessellated
//! under the configured [`FillRule`] into a fan/strip/triangle primitive
//! stream and reassembled by [`TriangulationBuilder`] into a
//! [`Triangulation`] whose triangles run clockwise about the normal.

pub mod builder;
pub mod config;
pub mod error;
pub mod primitive;
pub mod shape;
pub mod tessellation;
pub mod triangulation;
pub mod triangulator;

pub use builder::{TessellationCallback, TriangulationBuilder};
pub use config::{FillRule, TriangulatorConfig};
pub use error::{Result, TriangulationError};
pub use primitive::{PrimitiveKind, TessellationPrimitive, TriangleFan, TriangleList, TriangleStrip};
pub use shape::{contour_area, winding_number, Contour, PathSegment, Shape2D};
pub use tessellation::BasicTessellation;
pub use triangulation::Triangulation;
pub use triangulator::{FillTriangulator, Triangulator};

/// Triangulate `shape` with the default settings and the given flatness.
pub fn triangulate(shape: &Shape2D, flatness: f64) -> Result<Triangulation> {
    FillTriangulator::new(TriangulatorConfig::with_flatness(flatness)).triangulate(shape)
}
