//! Tessellation primitives: index sequences that decompose into triangles.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// How a primitive's vertex sequence is read as triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// Every triangle shares the first vertex.
    Fan,
    /// Each vertex after the second forms a triangle with the previous two,
    /// alternating winding so all triangles face the same way.
    Strip,
    /// Every three vertices form an independent triangle.
    Triangles,
}

/// A sequence of vertex indices with a fixed triangle decomposition.
///
/// The decomposition is computed on first use and cached.
pub trait TessellationPrimitive: fmt::Debug + Send + Sync {
    fn kind(&self) -> PrimitiveKind;

    fn vertices(&self) -> &[usize];

    fn triangles(&self) -> &[[usize; 3]];
}

/// Fan primitive: triangle `k` is `(v0, v[k + 1], v[k + 2])`.
#[derive(Debug, Clone, Default)]
pub struct TriangleFan {
    vertices: Vec<usize>,
    triangles: OnceLock<Vec<[usize; 3]>>,
}

impl TriangleFan {
    pub fn new(vertices: Vec<usize>) -> Self {
        Self {
            vertices,
            triangles: OnceLock::new(),
        }
    }

    /// Fan over `0..count`, the decomposition of a convex polygon.
    pub fn sequential(count: usize) -> Self {
        Self::new((0..count).collect())
    }
}

impl PartialEq for TriangleFan {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

impl TessellationPrimitive for TriangleFan {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Fan
    }

    fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    fn triangles(&self) -> &[[usize; 3]] {
        self.triangles.get_or_init(|| {
            let v = &self.vertices;
            if v.len() < 3 {
                return Vec::new();
            }
            (1..v.len() - 1).map(|k| [v[0], v[k], v[k + 1]]).collect()
        })
    }
}

/// Strip primitive: triangle `k` is `(v[k], v[k + 1], v[k + 2])` for even
/// `k` and `(v[k + 1], v[k], v[k + 2])` for odd `k`.
#[derive(Debug, Clone, Default)]
pub struct TriangleStrip {
    vertices: Vec<usize>,
    triangles: OnceLock<Vec<[usize; 3]>>,
}

impl TriangleStrip {
    pub fn new(vertices: Vec<usize>) -> Self {
        Self {
            vertices,
            triangles: OnceLock::new(),
        }
    }
}

impl PartialEq for TriangleStrip {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

impl TessellationPrimitive for TriangleStrip {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Strip
    }

    fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    fn triangles(&self) -> &[[usize; 3]] {
        self.triangles.get_or_init(|| {
            self.vertices
                .windows(3)
                .enumerate()
                .map(|(k, w)| if k % 2 == 0 { [w[0], w[1], w[2]] } else { [w[1], w[0], w[2]] })
                .collect()
        })
    }
}

/// Independent triangles; a trailing partial triple is ignored.
#[derive(Debug, Clone, Default)]
pub struct TriangleList {
    vertices: Vec<usize>,
    triangles: OnceLock<Vec<[usize; 3]>>,
}

impl TriangleList {
    pub fn new(vertices: Vec<usize>) -> Self {
        Self {
            vertices,
            triangles: OnceLock::new(),
        }
    }

    pub fn from_triangles(triangles: &[[usize; 3]]) -> Self {
        let list = Self::new(triangles.iter().flatten().copied().collect());
        // Freshly created; the cell cannot already hold a value.
        let _ = list.triangles.set(triangles.to_vec());
        list
    }
}

impl PartialEq for TriangleList {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

impl TessellationPrimitive for TriangleList {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Triangles
    }

    fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    fn triangles(&self) -> &[[usize; 3]] {
        self.triangles
            .get_or_init(|| self.vertices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
    }
}
