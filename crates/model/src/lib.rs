//! Polygon-mesh objects with cached, three-stage collision testing.
//!
//! An [`Object3D`] holds flat vertex coordinates and planar faces. Its
//! [`CollisionTester`] lazily derives a bounding sphere, an oriented
//! bounding box and an exact [`CollisionModel`], and tests pairs of objects
//! cheapest stage first. [`Scene`] places objects in a world frame and
//! sweeps them for collisions.

pub mod collision;
pub mod config;
pub mod error;
pub mod extrude;
pub mod object;
pub mod scene;

pub use collision::{
    rigid_isometry, test_oriented_bounding_box, BoundingSphere, CollisionGeometry, CollisionModel, CollisionTester,
    MeshCollider, TriMeshCollider,
};
pub use config::CollisionConfig;
pub use error::{Result, SceneError};
pub use extrude::{extrude_shape, ExtrusionOptions};
pub use object::{Face3D, Object3D};
pub use scene::{ObjectId, Scene, SceneObject};
