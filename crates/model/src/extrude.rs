//! Objects built by sweeping a 2D outline along a vector.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use geom_kernel::Vec3;
use geom_tessellation::{
    FillRule, FillTriangulator, Shape2D, TessellationPrimitive, TriangleList, Triangulation, Triangulator,
    TriangulatorConfig,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::object::{Face3D, Object3D};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrusionOptions {
    /// Curve flattening tolerance for the outline.
    pub flatness: f64,
    /// Close the swept end with a copy of the triangulated outline.
    pub top_cap: bool,
    /// Close the starting end.
    pub bottom_cap: bool,
    /// Which areas of a self-overlapping outline are solid.
    pub fill_rule: FillRule,
}

impl Default for ExtrusionOptions {
    fn default() -> Self {
        Self {
            flatness: 0.01,
            top_cap: true,
            bottom_cap: true,
            fill_rule: FillRule::EvenOdd,
        }
    }
}

/// Sweep `shape`, lying in the XY plane, along `extrusion`.
///
/// Vertices `0..n` are the triangulated outline at `z = 0` (including any
/// vertices added where edges cross) and `n..2n` the same points moved by
/// `extrusion`, so the object's box is the outline's extent swept by the
/// extrusion. Every boundary edge of the filled area becomes a quad facing
/// away from it, outline edges first; caps face away from the solid.
#[instrument(skip(shape, options), fields(segments = shape.segments().len()))]
pub fn extrude_shape(shape: &Shape2D, extrusion: Vec3, options: &ExtrusionOptions) -> Result<Object3D> {
    let triangulator = FillTriangulator::new(TriangulatorConfig {
        flatness: options.flatness,
        normal: Some(Vec3::Z),
        fill_rule: options.fill_rule,
    });
    let triangulation = triangulator.triangulate(shape)?;
    let n = triangulation.vertex_count();
    let bottom = triangulation.vertices();

    let mut coordinates = Vec::with_capacity(n * 6);
    coordinates.extend(bottom.iter().flat_map(|p| p.to_array()));
    coordinates.extend(bottom.iter().flat_map(|p| (*p + extrusion).to_array()));
    let mut object = Object3D::from_parts(coordinates, Vec::new())?;

    // Triangles come out clockwise about +z.
    let upward = extrusion.z >= 0.0;
    let facing_down = triangulation.triangles().to_vec();
    let facing_up: Vec<[usize; 3]> = facing_down.iter().map(|&[a, b, c]| [a, c, b]).collect();
    let (bottom_triangles, top_triangles) = if upward {
        (facing_down, facing_up)
    } else {
        (facing_up, facing_down)
    };
    if !triangulation.is_empty() {
        if options.bottom_cap {
            object.add_face(cap_face((0..n).collect(), &bottom_triangles)?)?;
        }
        if options.top_cap {
            object.add_face(cap_face((n..2 * n).collect(), &top_triangles)?)?;
        }
    }

    for (u, v) in boundary_edges(&triangulation) {
        // The solid lies right of u -> v; [a, b, b', a'] faces right of
        // a -> b when sweeping up.
        let quad = if upward {
            vec![v, u, u + n, v + n]
        } else {
            vec![u, v, v + n, u + n]
        };
        object.add_face(Face3D::new(quad))?;
    }

    debug!(
        vertices = object.vertex_count(),
        faces = object.faces().len(),
        "extruded outline"
    );
    Ok(object)
}

/// Directed triangle edges with no twin, so the filled area lies on their
/// right. Edges along an outline come first in outline order, then edges
/// split at crossings in triangle order.
fn boundary_edges(triangulation: &Triangulation) -> Vec<(usize, usize)> {
    let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
    for &[a, b, c] in triangulation.triangles() {
        for edge in [(a, b), (b, c), (c, a)] {
            *directed.entry(edge).or_default() += 1;
        }
    }
    let is_boundary = |(u, v): (usize, usize)| directed.contains_key(&(u, v)) && !directed.contains_key(&(v, u));

    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    let outline_edges = triangulation.outlines().iter().flat_map(|outline| {
        let len = outline.len();
        (0..len).flat_map(move |e| {
            let (a, b) = (outline[e], outline[(e + 1) % len]);
            [(a, b), (b, a)]
        })
    });
    let triangle_edges = triangulation
        .triangles()
        .iter()
        .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)]);
    for edge in outline_edges.chain(triangle_edges) {
        if is_boundary(edge) && seen.insert(edge) {
            edges.push(edge);
        }
    }
    edges
}

/// Cap over `vertex_indices`, whose positions match the triangulation's
/// vertex order.
fn cap_face(vertex_indices: Vec<usize>, triangles: &[[usize; 3]]) -> Result<Face3D> {
    let primitive: Arc<dyn TessellationPrimitive> = Arc::new(TriangleList::from_triangles(triangles));
    Ok(Face3D::with_primitives(vertex_indices, vec![primitive])?)
}
