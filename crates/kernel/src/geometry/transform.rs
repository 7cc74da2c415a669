use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// A 4x4 affine transformation matrix stored in column-major order.
///
/// Only affine matrices are produced by the constructors (bottom row is
/// `0 0 0 1`), so the upper-left 3x3 block is the rotation/scale part and
/// the last column is the translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Column-major 4x4 matrix entries.
    pub m: [f64; 16],
}

impl Transform {
    pub fn identity() -> Self {
        #[rustfmt::skip]
        let m = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { m }
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        #[rustfmt::skip]
        let m = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            dx,  dy,  dz,  1.0,
        ];
        Self { m }
    }

    pub fn from_translation_vec(v: Vec3) -> Self {
        Self::translation(v.x, v.y, v.z)
    }

    /// Build from a row-major 3x3 linear part and a translation.
    pub fn from_rotation_translation(r: [[f64; 3]; 3], t: Vec3) -> Self {
        #[rustfmt::skip]
        let m = [
            r[0][0], r[1][0], r[2][0], 0.0,
            r[0][1], r[1][1], r[2][1], 0.0,
            r[0][2], r[1][2], r[2][2], 0.0,
            t.x,     t.y,     t.z,     1.0,
        ];
        Self { m }
    }

    /// Rotation around the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rotation_translation([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]], Vec3::ZERO)
    }

    /// Rotation around the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rotation_translation([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]], Vec3::ZERO)
    }

    /// Rotation around the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rotation_translation([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]], Vec3::ZERO)
    }

    /// Matrix element access (row, col), 0-indexed.
    pub fn element(&self, row: usize, col: usize) -> f64 {
        self.m[col * 4 + row]
    }

    /// Row-major copy of the upper-left 3x3 block.
    pub fn rotation(&self) -> [[f64; 3]; 3] {
        let mut r = [[0.0; 3]; 3];
        for (row, values) in r.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value = self.element(row, col);
            }
        }
        r
    }

    pub fn translation_vec(&self) -> Vec3 {
        Vec3::new(self.element(0, 3), self.element(1, 3), self.element(2, 3))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Transform a point (applies translation).
    pub fn transform_point(&self, p: &Point3d) -> Point3d {
        let x = self.element(0, 0) * p.x + self.element(0, 1) * p.y + self.element(0, 2) * p.z + self.element(0, 3);
        let y = self.element(1, 0) * p.x + self.element(1, 1) * p.y + self.element(1, 2) * p.z + self.element(1, 3);
        let z = self.element(2, 0) * p.x + self.element(2, 1) * p.y + self.element(2, 2) * p.z + self.element(2, 3);
        Point3d::new(x, y, z)
    }

    /// Matrix product `self * other`: the result applies `other` first.
    pub fn compose(&self, other: &Transform) -> Transform {
        let mut result = [0.0f64; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.element(row, k) * other.element(k, col);
                }
                result[col * 4 + row] = sum;
            }
        }
        Transform { m: result }
    }

    /// Inverse of the affine transform. Returns `None` if the linear part is
    /// singular.
    pub fn inverse(&self) -> Option<Self> {
        let r = self.rotation();

        let c00 = r[1][1] * r[2][2] - r[1][2] * r[2][1];
        let c01 = r[1][2] * r[2][0] - r[1][0] * r[2][2];
        let c02 = r[1][0] * r[2][1] - r[1][1] * r[2][0];
        let det = r[0][0] * c00 + r[0][1] * c01 + r[0][2] * c02;
        if det.abs() < 1e-15 {
            return None;
        }
        let inv_det = 1.0 / det;

        #[rustfmt::skip]
        let inv = [
            [c00 * inv_det, (r[0][2] * r[2][1] - r[0][1] * r[2][2]) * inv_det, (r[0][1] * r[1][2] - r[0][2] * r[1][1]) * inv_det],
            [c01 * inv_det, (r[0][0] * r[2][2] - r[0][2] * r[2][0]) * inv_det, (r[0][2] * r[1][0] - r[0][0] * r[1][2]) * inv_det],
            [c02 * inv_det, (r[0][1] * r[2][0] - r[0][0] * r[2][1]) * inv_det, (r[0][0] * r[1][1] - r[0][1] * r[1][0]) * inv_det],
        ];

        let t = self.translation_vec();
        let inv_t = Vec3::new(
            -(inv[0][0] * t.x + inv[0][1] * t.y + inv[0][2] * t.z),
            -(inv[1][0] * t.x + inv[1][1] * t.y + inv[1][2] * t.z),
            -(inv[2][0] * t.x + inv[2][1] * t.y + inv[2][2] * t.z),
        );
        Some(Self::from_rotation_translation(inv, inv_t))
    }

}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned bounding box given by its min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    pub fn new(min: Point3d, max: Point3d) -> Self {
        Self { min, max }
    }

    /// The inverted box that any `expand_to_include` call replaces.
    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points(points: &[Point3d]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    /// Bounds of a flat `[x, y, z, ...]` coordinate slice. An empty slice
    /// yields a zero-size box at the origin rather than an inverted one.
    pub fn from_flat_coordinates(coords: &[f64]) -> Self {
        if coords.len() < 3 {
            return Self::new(Point3d::ORIGIN, Point3d::ORIGIN);
        }
        let mut bb = Self::empty();
        for xyz in coords.chunks_exact(3) {
            bb.expand_to_include(&Point3d::new(xyz[0], xyz[1], xyz[2]));
        }
        bb
    }

    pub fn expand_to_include(&mut self, p: &Point3d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn center(&self) -> Point3d {
        self.min.midpoint(&self.max)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vec3::new(margin, margin, margin);
        Self::new(self.min - m, self.max + m)
    }
}
