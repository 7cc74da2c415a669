//! Narrow-phase mesh colliders.

use std::fmt;

use geom_kernel::Transform;
use parry3d_f64::math::Isometry;
use parry3d_f64::na::{Matrix3, Rotation3, Translation3, UnitQuaternion};
use parry3d_f64::query;
use parry3d_f64::shape::TriMesh;
use tracing::{debug, warn};

use super::model::CollisionModel;

/// Exact mesh-versus-mesh intersection strategy.
///
/// `from2to1` places `model2` in `model1`'s frame. Implementations never
/// modify either model.
pub trait MeshCollider: fmt::Debug + Send + Sync {
    fn intersects(&self, model1: &CollisionModel, from2to1: &Transform, model2: &CollisionModel) -> bool;
}

/// Rigid part of `transform`, or `None` when it scales, shears or mirrors.
pub fn rigid_isometry(transform: &Transform) -> Option<Isometry<f64>> {
    let r = transform.rotation();
    let m = Matrix3::new(
        r[0][0], r[0][1], r[0][2], //
        r[1][0], r[1][1], r[1][2], //
        r[2][0], r[2][1], r[2][2],
    );
    let drift = m * m.transpose() - Matrix3::identity();
    if drift.iter().any(|e| e.abs() > 1e-9) || m.determinant() <= 0.0 {
        return None;
    }
    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m));
    let t = transform.translation_vec();
    Some(Isometry::from_parts(Translation3::new(t.x, t.y, t.z), rotation))
}

/// Tests the two models' parry triangle meshes, placing the second by the
/// relative isometry. Surfaces within `tolerance` of each other count as
/// touching; a non-rigid placement is baked into a moved copy of the
/// second model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriMeshCollider {
    tolerance: f64,
}

impl TriMeshCollider {
    pub fn new(contact_tolerance: f64) -> Self {
        Self {
            tolerance: contact_tolerance.max(0.0),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn meshes_touch(&self, mesh1: &TriMesh, pos2: &Isometry<f64>, mesh2: &TriMesh) -> bool {
        let pos1 = Isometry::identity();
        match query::intersection_test(&pos1, mesh1, pos2, mesh2) {
            Ok(true) => true,
            Ok(false) if self.tolerance > 0.0 => {
                matches!(query::distance(&pos1, mesh1, pos2, mesh2), Ok(d) if d <= self.tolerance)
            }
            Ok(false) => false,
            Err(error) => {
                warn!(?error, "mesh pair not supported by the narrow phase");
                false
            }
        }
    }
}

impl Default for TriMeshCollider {
    fn default() -> Self {
        Self::new(1e-9)
    }
}

impl MeshCollider for TriMeshCollider {
    fn intersects(&self, model1: &CollisionModel, from2to1: &Transform, model2: &CollisionModel) -> bool {
        let Some(mesh1) = model1.mesh() else {
            return false;
        };
        match rigid_isometry(from2to1) {
            Some(pos2) => model2
                .mesh()
                .is_some_and(|mesh2| self.meshes_touch(mesh1, &pos2, mesh2)),
            None => {
                debug!("placement is not rigid, moving the second mesh");
                let moved = model2.transformed(from2to1);
                moved
                    .mesh()
                    .is_some_and(|mesh2| self.meshes_touch(mesh1, &Isometry::identity(), mesh2))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::model::Triangle;
    use geom_kernel::{Point3d, Vec3};

    /// Two triangles per face of an axis-aligned unit cube at the origin.
    fn unit_cube_triangles() -> Vec<Triangle> {
        let p = |x: f64, y: f64, z: f64| Point3d::new(x, y, z);
        let quads = [
            [p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 0.0, 0.0)],
            [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(1.0, 1.0, 1.0), p(0.0, 1.0, 1.0)],
            [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 0.0, 1.0), p(0.0, 0.0, 1.0)],
            [p(0.0, 1.0, 0.0), p(0.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, 0.0)],
            [p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0), p(0.0, 1.0, 1.0), p(0.0, 1.0, 0.0)],
            [p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 1.0, 1.0), p(1.0, 0.0, 1.0)],
        ];
        quads
            .iter()
            .flat_map(|q| [[q[0], q[1], q[2]], [q[0], q[2], q[3]]])
            .collect()
    }

    fn cube_model() -> CollisionModel {
        CollisionModel::new(unit_cube_triangles())
    }

    #[test]
    fn test_overlapping_cubes_intersect() {
        let cube = cube_model();
        let collider = TriMeshCollider::default();
        assert!(collider.intersects(&cube, &Transform::translation(0.5, 0.5, 0.5), &cube));
        assert!(collider.intersects(&cube, &Transform::rotation_z(0.3), &cube));
    }

    #[test]
    fn test_separated_cubes_do_not_intersect() {
        let cube = cube_model();
        let collider = TriMeshCollider::default();
        assert!(!collider.intersects(&cube, &Transform::translation(1.5, 0.0, 0.0), &cube));
        assert!(!collider.intersects(&cube, &Transform::translation(0.0, 0.0, -1.01), &cube));
    }

    #[test]
    fn test_contact_within_tolerance_counts() {
        let cube = cube_model();
        let gap = Transform::translation(1.0 + 1e-4, 0.0, 0.0);
        assert!(!TriMeshCollider::new(1e-6).intersects(&cube, &gap, &cube));
        assert!(TriMeshCollider::new(1e-3).intersects(&cube, &gap, &cube));
    }

    #[test]
    fn test_nested_surfaces_do_not_touch() {
        // A small cube floating inside a big one: the surfaces never meet.
        let big = CollisionModel::new(
            unit_cube_triangles()
                .iter()
                .map(|t| t.map(|p| Point3d::new(p.x * 10.0, p.y * 10.0, p.z * 10.0)))
                .collect(),
        );
        let small = cube_model();
        assert!(!TriMeshCollider::default().intersects(&big, &Transform::translation(4.0, 4.0, 4.0), &small));
    }

    #[test]
    fn test_scaled_placement_moves_the_second_mesh() {
        let cube = cube_model();
        // Shrunk to a tenth and floating in the middle: no contact. Scaled
        // up three times from the same spot: the surfaces cross.
        let shrunk = Transform::from_rotation_translation(
            [[0.1, 0.0, 0.0], [0.0, 0.1, 0.0], [0.0, 0.0, 0.1]],
            Vec3::new(0.45, 0.45, 0.45),
        );
        let grown = Transform::from_rotation_translation(
            [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]],
            Vec3::new(0.45, 0.45, 0.45),
        );
        assert!(rigid_isometry(&shrunk).is_none());
        let collider = TriMeshCollider::default();
        assert!(!collider.intersects(&cube, &shrunk, &cube));
        assert!(collider.intersects(&cube, &grown, &cube));
    }

    #[test]
    fn test_rigid_isometry_matches_transform() {
        let t = Transform::translation(1.0, -2.0, 0.5).compose(&Transform::rotation_x(0.7));
        let iso = rigid_isometry(&t).unwrap();
        let p = Point3d::new(0.3, 0.8, -1.1);
        let expected = t.transform_point(&p);
        let moved = iso * parry3d_f64::math::Point::new(p.x, p.y, p.z);
        assert!((moved.x - expected.x).abs() < 1e-12);
        assert!((moved.y - expected.y).abs() < 1e-12);
        assert!((moved.z - expected.z).abs() < 1e-12);
    }

    #[test]
    fn test_empty_model_never_intersects() {
        let empty = CollisionModel::default();
        let cube = cube_model();
        let collider = TriMeshCollider::default();
        assert!(!collider.intersects(&empty, &Transform::identity(), &cube));
        assert!(!collider.intersects(&cube, &Transform::identity(), &empty));
    }
}
