//! Polygon-mesh scene objects.

use std::sync::Arc;

use geom_kernel::{BoundingBox, Point3d, Transform, Vec3};
use geom_tessellation::{TessellationPrimitive, TriangleFan, TriangleList, Triangulation, TriangulationError};

use crate::collision::{BoundingSphere, CollisionGeometry, CollisionModel, CollisionTester, Triangle};
use crate::config::CollisionConfig;
use crate::error::{Result, SceneError};

/// A planar polygon of an [`Object3D`].
///
/// `vertex_indices` point into the object's vertices. Primitives index into
/// `vertex_indices` (face-local); a face without primitives is split as a
/// triangle fan.
#[derive(Debug, Clone, Default)]
pub struct Face3D {
    vertex_indices: Vec<usize>,
    primitives: Vec<Arc<dyn TessellationPrimitive>>,
}

impl Face3D {
    pub fn new(vertex_indices: Vec<usize>) -> Self {
        Self {
            vertex_indices,
            primitives: Vec::new(),
        }
    }

    /// Fails if a primitive refers past the end of `vertex_indices`.
    pub fn with_primitives(
        vertex_indices: Vec<usize>,
        primitives: Vec<Arc<dyn TessellationPrimitive>>,
    ) -> std::result::Result<Self, TriangulationError> {
        let vertex_count = vertex_indices.len();
        if let Some(&index) = primitives
            .iter()
            .flat_map(|p| p.vertices())
            .find(|&&index| index >= vertex_count)
        {
            return Err(TriangulationError::VertexOutOfRange { index, vertex_count });
        }
        Ok(Self {
            vertex_indices,
            primitives,
        })
    }

    pub fn vertex_indices(&self) -> &[usize] {
        &self.vertex_indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_indices.len()
    }

    pub fn primitives(&self) -> &[Arc<dyn TessellationPrimitive>] {
        &self.primitives
    }

    /// Triangles as object vertex indices.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let to_object = |t: &[usize; 3]| t.map(|i| self.vertex_indices[i]);
        if self.primitives.is_empty() {
            TriangleFan::sequential(self.vertex_indices.len())
                .triangles()
                .iter()
                .map(to_object)
                .collect()
        } else {
            self.primitives
                .iter()
                .flat_map(|p| p.triangles().iter().map(to_object))
                .collect()
        }
    }

    /// Unit normal from the area-weighted sum of the face's triangles;
    /// `None` for a degenerate face or an index past the coordinates.
    pub fn normal(&self, coordinates: &[f64]) -> Option<Vec3> {
        let mut sum = Vec3::ZERO;
        for t in self.triangles() {
            let [a, b, c] = t.map(|i| Point3d::from_flat(coordinates, i));
            let (a, b, c) = (a?, b?, c?);
            sum = sum + (b - a).cross(&(c - a));
        }
        sum.normalized()
    }

    /// Signed distance of the face plane from the origin along `normal`.
    pub fn distance(&self, coordinates: &[f64]) -> Option<f64> {
        let normal = self.normal(coordinates)?;
        let first = Point3d::from_flat(coordinates, *self.vertex_indices.first()?)?;
        Some(normal.dot(&first.to_vec3()))
    }
}

/// A mesh object: flat vertex coordinates, faces over them, and the
/// collision cache derived from both.
///
/// Every mutation invalidates the collision cache.
#[derive(Debug, Clone, Default)]
pub struct Object3D {
    vertex_coordinates: Vec<f64>,
    faces: Vec<Face3D>,
    collision: CollisionTester,
}

impl Object3D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collision_config(config: CollisionConfig) -> Self {
        Self {
            collision: CollisionTester::new(config),
            ..Self::default()
        }
    }

    pub fn from_parts(vertex_coordinates: Vec<f64>, faces: Vec<Face3D>) -> Result<Self> {
        let mut object = Self {
            vertex_coordinates,
            ..Self::default()
        };
        for face in faces {
            object.add_face(face)?;
        }
        Ok(object)
    }

    /// Axis-aligned box from the origin to `(width, height, depth)` with
    /// outward-facing quads.
    pub fn cuboid(width: f64, height: f64, depth: f64) -> Self {
        let mut coordinates = Vec::with_capacity(24);
        for i in 0..8 {
            coordinates.push(if i & 1 == 0 { 0.0 } else { width });
            coordinates.push(if i & 2 == 0 { 0.0 } else { height });
            coordinates.push(if i & 4 == 0 { 0.0 } else { depth });
        }
        let faces = [[0, 2, 3, 1], [4, 5, 7, 6], [0, 1, 5, 4], [2, 6, 7, 3], [0, 4, 6, 2], [1, 3, 7, 5]]
            .into_iter()
            .map(|quad| Face3D::new(quad.to_vec()))
            .collect();
        Self {
            vertex_coordinates: coordinates,
            faces,
            ..Self::default()
        }
    }

    /// Single-face object from a triangulated outline placed by `transform`.
    pub fn from_triangulation(triangulation: &Triangulation, transform: &Transform) -> Self {
        let vertex_coordinates = triangulation
            .transformed_vertices(transform)
            .iter()
            .flat_map(|p| p.to_array())
            .collect();
        let mut object = Self {
            vertex_coordinates,
            ..Self::default()
        };
        if !triangulation.is_empty() {
            let primitive: Arc<dyn TessellationPrimitive> = Arc::new(TriangleList::from_triangles(triangulation.triangles()));
            object.faces.push(Face3D {
                vertex_indices: (0..triangulation.vertex_count()).collect(),
                primitives: vec![primitive],
            });
        }
        object
    }

    pub fn vertex_coordinates(&self) -> &[f64] {
        &self.vertex_coordinates
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_coordinates.len() / 3
    }

    pub fn vertex(&self, index: usize) -> Option<Point3d> {
        Point3d::from_flat(&self.vertex_coordinates, index)
    }

    pub fn faces(&self) -> &[Face3D] {
        &self.faces
    }

    pub fn add_vertex(&mut self, point: Point3d) -> usize {
        self.vertex_coordinates.extend_from_slice(&point.to_array());
        self.collision.invalidate();
        self.vertex_count() - 1
    }

    /// Move vertex `index`, returning its previous position.
    pub fn set_vertex(&mut self, index: usize, point: Point3d) -> Option<Point3d> {
        let previous = self.vertex(index)?;
        self.vertex_coordinates[index * 3..index * 3 + 3].copy_from_slice(&point.to_array());
        self.collision.invalidate();
        Some(previous)
    }

    /// Apply `transform` to every vertex in place.
    pub fn transform_vertices(&mut self, transform: &Transform) {
        for xyz in self.vertex_coordinates.chunks_exact_mut(3) {
            let p = transform.transform_point(&Point3d::new(xyz[0], xyz[1], xyz[2]));
            xyz.copy_from_slice(&p.to_array());
        }
        self.collision.invalidate();
    }

    /// Append `face`, returning its index. Fails if it references a vertex
    /// the object does not have.
    pub fn add_face(&mut self, face: Face3D) -> Result<usize> {
        let vertex_count = self.vertex_count();
        if let Some(&index) = face.vertex_indices.iter().find(|&&i| i >= vertex_count) {
            return Err(SceneError::VertexOutOfRange {
                face: self.faces.len(),
                index,
                vertex_count,
            });
        }
        self.faces.push(face);
        self.collision.invalidate();
        Ok(self.faces.len() - 1)
    }

    pub fn clear(&mut self) {
        self.vertex_coordinates.clear();
        self.faces.clear();
        self.collision.invalidate();
    }

    /// Every face's triangles as object vertex indices.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        self.faces.iter().flat_map(Face3D::triangles).collect()
    }

    pub fn collision_tester(&self) -> &CollisionTester {
        &self.collision
    }

    pub fn invalidate(&self) {
        self.collision.invalidate();
    }

    pub fn oriented_bounding_box(&self) -> BoundingBox {
        self.collision.oriented_bounding_box(self)
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.collision.bounding_sphere(self)
    }

    pub fn collision_model(&self) -> Arc<CollisionModel> {
        self.collision.collision_model(self)
    }

    /// Whether `other`, placed in this object's frame by
    /// `from_other_to_this`, touches or overlaps this object.
    pub fn test_collision(&self, from_other_to_this: &Transform, other: &Object3D) -> bool {
        self.collision
            .test_collision(self, from_other_to_this, &other.collision, other)
    }
}

impl CollisionGeometry for Object3D {
    fn vertex_coordinates(&self) -> &[f64] {
        &self.vertex_coordinates
    }

    fn collision_triangles(&self) -> Vec<Triangle> {
        // Face indices are checked on insertion.
        self.triangles()
            .into_iter()
            .filter_map(|t| {
                let [a, b, c] = t.map(|i| Point3d::from_flat(&self.vertex_coordinates, i));
                Some([a?, b?, c?])
            })
            .collect()
    }
}
