//! Triangle-soup collision models backed by a parry triangle mesh.

use geom_kernel::{BoundingBox, Point3d, Transform};
use parry3d_f64::math::Point;
use parry3d_f64::shape::TriMesh;
use tracing::warn;

pub type Triangle = [Point3d; 3];

/// Triangles of an object in its local frame plus the triangle mesh (with
/// its own bounding volume hierarchy) the exact test runs on. An empty
/// soup has no mesh.
#[derive(Debug, Clone, Default)]
pub struct CollisionModel {
    triangles: Vec<Triangle>,
    mesh: Option<TriMesh>,
}

impl CollisionModel {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let mesh = if triangles.is_empty() {
            None
        } else {
            let vertices: Vec<Point<f64>> = triangles
                .iter()
                .flatten()
                .map(|p| Point::new(p.x, p.y, p.z))
                .collect();
            let indices: Vec<[u32; 3]> = (0..triangles.len() as u32).map(|i| [3 * i, 3 * i + 1, 3 * i + 2]).collect();
            match TriMesh::new(vertices, indices) {
                Ok(mesh) => Some(mesh),
                Err(error) => {
                    warn!(?error, triangles = triangles.len(), "could not build triangle mesh");
                    None
                }
            }
        };
        Self { triangles, mesh }
    }

    /// Copy with every vertex moved by `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self::new(
            self.triangles
                .iter()
                .map(|t| t.map(|p| transform.transform_point(&p)))
                .collect(),
        )
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn mesh(&self) -> Option<&TriMesh> {
        self.mesh.as_ref()
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        (!self.is_empty()).then(|| BoundingBox::from_points(&self.triangles.concat()))
    }

    /// Flat `x, y, z` list, three vertices per triangle.
    pub fn to_flat_coordinates(&self) -> Vec<f64> {
        self.triangles
            .iter()
            .flat_map(|t| t.iter().flat_map(|p| p.to_array()))
            .collect()
    }
}
