//! Broad-phase bounding volumes: bounding spheres and oriented boxes.

use geom_kernel::{BoundingBox, Point3d, Transform};
use serde::{Deserialize, Serialize};

/// Sphere around an object's vertices, centred on its oriented bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Point3d,
    pub radius: f64,
}

impl BoundingSphere {
    /// Smallest sphere centred on `obb` that holds every vertex in the flat
    /// `x, y, z` coordinate list. No vertices gives radius 0.
    pub fn around(obb: &BoundingBox, coordinates: &[f64]) -> Self {
        let center = obb.center();
        let radius_squared = coordinates
            .chunks_exact(3)
            .map(|xyz| center.distance_squared_to(&Point3d::new(xyz[0], xyz[1], xyz[2])))
            .fold(0.0, f64::max);
        Self {
            center,
            radius: radius_squared.sqrt(),
        }
    }

    /// Strict overlap test with `other` placed by `from_other_to_this`.
    pub fn intersects(&self, from_other_to_this: &Transform, other: &BoundingSphere) -> bool {
        let other_center = from_other_to_this.transform_point(&other.center);
        let reach = self.radius + other.radius;
        self.center.distance_squared_to(&other_center) < reach * reach
    }
}

/// Separating-axis test between two oriented boxes.
///
/// Each box is given by local min/max corners; `from2to1` places the second
/// box's frame in the first's and must be rigid. The 15 candidate axes are
/// the three face normals of each box and the nine cross products of their
/// edge directions. Touching boxes count as overlapping.
pub fn test_oriented_bounding_box(box1: &BoundingBox, from2to1: &Transform, box2: &BoundingBox) -> bool {
    let a = box1.half_extents().to_array();
    let b = box2.half_extents().to_array();
    let r = from2to1.rotation();
    let abs_r = r.map(|row| row.map(f64::abs));
    let t = (from2to1.transform_point(&box2.center()) - box1.center()).to_array();

    // Face normals of box 1.
    for i in 0..3 {
        let rb = b[0] * abs_r[i][0] + b[1] * abs_r[i][1] + b[2] * abs_r[i][2];
        if t[i].abs() > a[i] + rb {
            return false;
        }
    }

    // Face normals of box 2.
    for j in 0..3 {
        let ra = a[0] * abs_r[0][j] + a[1] * abs_r[1][j] + a[2] * abs_r[2][j];
        let tj = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
        if tj.abs() > ra + b[j] {
            return false;
        }
    }

    // Edge cross products.
    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let ra = a[i1] * abs_r[i2][j] + a[i2] * abs_r[i1][j];
            let rb = b[j1] * abs_r[i][j2] + b[j2] * abs_r[i][j1];
            let tl = t[i2] * r[i1][j] - t[i1] * r[i2][j];
            if tl.abs() > ra + rb {
                return false;
            }
        }
    }

    true
}
