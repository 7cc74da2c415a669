//! Points, vectors, affine transforms and axis-aligned boxes shared by the
//! tessellation and collision crates.

pub mod geometry;

pub use geometry::point::{Point2d, Point3d};
pub use geometry::transform::{BoundingBox, Transform};
pub use geometry::vector::Vec3;
