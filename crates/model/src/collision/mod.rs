//! Three-stage collision testing between rigid triangle meshes.
//!
//! Each object owns a [`CollisionTester`] caching its bounding sphere,
//! oriented bounding box and [`CollisionModel`]. A pair test rejects with
//! the sphere first, then a separating-axis test on the boxes, and only
//! then runs the exact [`MeshCollider`].

pub mod bounds;
pub mod collider;
pub mod model;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use geom_kernel::{BoundingBox, Transform};
use tracing::{debug, instrument};

use crate::config::CollisionConfig;

pub use bounds::{test_oriented_bounding_box, BoundingSphere};
pub use collider::{rigid_isometry, MeshCollider, TriMeshCollider};
pub use model::{CollisionModel, Triangle};

/// Geometry a [`CollisionTester`] derives its cached volumes from.
pub trait CollisionGeometry {
    /// Flat `x, y, z` vertex coordinates in the local frame.
    fn vertex_coordinates(&self) -> &[f64];

    /// Every face's triangles as local-frame positions.
    fn collision_triangles(&self) -> Vec<Triangle>;

    /// Local box used by the broad phase. Defaults to the vertices' extent.
    fn oriented_bounds(&self) -> BoundingBox {
        BoundingBox::from_flat_coordinates(self.vertex_coordinates())
    }
}

static NEXT_TESTER_ID: AtomicU64 = AtomicU64::new(0);

/// Lazily computed volumes; `None` means not computed since the last
/// invalidation.
#[derive(Debug, Default)]
struct CollisionCache {
    obb: Option<BoundingBox>,
    sphere: Option<BoundingSphere>,
    model: Option<Arc<CollisionModel>>,
}

impl CollisionCache {
    fn obb(&mut self, geometry: &dyn CollisionGeometry) -> BoundingBox {
        *self.obb.get_or_insert_with(|| {
            let obb = geometry.oriented_bounds();
            debug!(min = ?obb.min, max = ?obb.max, "computed oriented bounding box");
            obb
        })
    }

    fn sphere(&mut self, geometry: &dyn CollisionGeometry) -> BoundingSphere {
        if let Some(sphere) = self.sphere {
            return sphere;
        }
        let obb = self.obb(geometry);
        let sphere = BoundingSphere::around(&obb, geometry.vertex_coordinates());
        debug!(center = ?sphere.center, radius = sphere.radius, "computed bounding sphere");
        self.sphere = Some(sphere);
        sphere
    }

    fn model(&mut self, geometry: &dyn CollisionGeometry) -> Arc<CollisionModel> {
        Arc::clone(self.model.get_or_insert_with(|| {
            let model = CollisionModel::new(geometry.collision_triangles());
            debug!(triangles = model.triangle_count(), "built collision model");
            Arc::new(model)
        }))
    }
}

/// Both caches of a pair test, locked in id order.
enum LockedPair<'a> {
    /// An object tested against itself.
    Same(MutexGuard<'a, CollisionCache>),
    Distinct(MutexGuard<'a, CollisionCache>, MutexGuard<'a, CollisionCache>),
}

impl LockedPair<'_> {
    /// Evaluate `f` for this object's cache, then the other's.
    fn each<T>(
        &mut self,
        geometry: &dyn CollisionGeometry,
        other_geometry: &dyn CollisionGeometry,
        mut f: impl FnMut(&mut CollisionCache, &dyn CollisionGeometry) -> T,
    ) -> (T, T) {
        match self {
            LockedPair::Same(cache) => {
                let first = f(&mut **cache, geometry);
                let second = f(&mut **cache, geometry);
                (first, second)
            }
            LockedPair::Distinct(this, other) => (f(&mut **this, geometry), f(&mut **other, other_geometry)),
        }
    }
}

/// Per-object collision state: cached volumes behind a mutex plus the
/// narrow-phase strategy.
///
/// Pair tests lock both objects' caches in ascending id order, so
/// concurrent A-vs-B and B-vs-A tests cannot deadlock.
#[derive(Debug)]
pub struct CollisionTester {
    id: u64,
    config: CollisionConfig,
    collider: Arc<dyn MeshCollider>,
    cache: Mutex<CollisionCache>,
}

impl Default for CollisionTester {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

/// A clone gets its own id and an empty cache.
impl Clone for CollisionTester {
    fn clone(&self) -> Self {
        Self::with_collider(self.config, Arc::clone(&self.collider))
    }
}

impl CollisionTester {
    pub fn new(config: CollisionConfig) -> Self {
        Self::with_collider(config, Arc::new(TriMeshCollider::new(config.contact_tolerance)))
    }

    pub fn with_collider(config: CollisionConfig, collider: Arc<dyn MeshCollider>) -> Self {
        Self {
            id: NEXT_TESTER_ID.fetch_add(1, Ordering::Relaxed),
            config,
            collider,
            cache: Mutex::new(CollisionCache::default()),
        }
    }

    /// Stable identity used to order lock acquisition.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    // The cache only holds derived data, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, CollisionCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_with<'a>(&'a self, other: &'a CollisionTester) -> LockedPair<'a> {
        if self.id == other.id {
            LockedPair::Same(self.lock())
        } else if self.id < other.id {
            let this = self.lock();
            LockedPair::Distinct(this, other.lock())
        } else {
            let other = other.lock();
            LockedPair::Distinct(self.lock(), other)
        }
    }

    /// Drop every cached volume; the next query recomputes them all.
    pub fn invalidate(&self) {
        *self.lock() = CollisionCache::default();
        debug!(tester = self.id, "invalidated collision cache");
    }

    pub fn oriented_bounding_box(&self, geometry: &dyn CollisionGeometry) -> BoundingBox {
        self.lock().obb(geometry)
    }

    pub fn bounding_sphere(&self, geometry: &dyn CollisionGeometry) -> BoundingSphere {
        self.lock().sphere(geometry)
    }

    pub fn collision_model(&self, geometry: &dyn CollisionGeometry) -> Arc<CollisionModel> {
        self.lock().model(geometry)
    }

    /// Whether the exact collision model is currently cached.
    pub fn has_collision_model(&self) -> bool {
        self.lock().model.is_some()
    }

    /// Whether `other_geometry`, placed in this object's frame by
    /// `from_other_to_this`, touches or overlaps `geometry`.
    #[instrument(skip_all, fields(this = self.id, other = other.id))]
    pub fn test_collision(
        &self,
        geometry: &dyn CollisionGeometry,
        from_other_to_this: &Transform,
        other: &CollisionTester,
        other_geometry: &dyn CollisionGeometry,
    ) -> bool {
        let mut locked = self.lock_with(other);

        let (sphere, other_sphere) = locked.each(geometry, other_geometry, |cache, g| cache.sphere(g));
        if !sphere.intersects(from_other_to_this, &other_sphere) {
            debug!("rejected by bounding spheres");
            return false;
        }

        let (obb, other_obb) = locked.each(geometry, other_geometry, |cache, g| cache.obb(g));
        if !test_oriented_bounding_box(&obb, from_other_to_this, &other_obb) {
            debug!("rejected by oriented bounding boxes");
            return false;
        }

        let (model, other_model) = locked.each(geometry, other_geometry, |cache, g| cache.model(g));
        let hit = self.collider.intersects(&model, from_other_to_this, &other_model);
        debug!(hit, "exact mesh test");
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geom_kernel::Point3d;
    use std::sync::atomic::AtomicUsize;

    /// Single triangle that counts how often its collision model is built.
    struct CountingTriangle {
        coords: Vec<f64>,
        builds: AtomicUsize,
    }

    impl CountingTriangle {
        fn new(offset: f64) -> Self {
            Self {
                coords: vec![offset, 0.0, 0.0, offset + 1.0, 0.0, 0.0, offset, 1.0, 0.0],
                builds: AtomicUsize::new(0),
            }
        }
    }

    impl CollisionGeometry for CountingTriangle {
        fn vertex_coordinates(&self) -> &[f64] {
            &self.coords
        }

        fn collision_triangles(&self) -> Vec<Triangle> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            let p = |i: usize| Point3d::from_flat(&self.coords, i).unwrap();
            vec![[p(0), p(1), p(2)]]
        }
    }

    #[test]
    fn test_far_objects_skip_the_exact_model() {
        let (a, b) = (CountingTriangle::new(0.0), CountingTriangle::new(0.0));
        let (ta, tb) = (CollisionTester::default(), CollisionTester::default());
        assert!(!ta.test_collision(&a, &Transform::translation(100.0, 0.0, 0.0), &tb, &b));
        assert!(!ta.has_collision_model());
        assert!(!tb.has_collision_model());
        assert_eq!(a.builds.load(Ordering::SeqCst) + b.builds.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_model_built_once_and_reused() {
        let (a, b) = (CountingTriangle::new(0.0), CountingTriangle::new(0.0));
        let (ta, tb) = (CollisionTester::default(), CollisionTester::default());
        let overlap = Transform::translation(0.2, 0.2, 0.0);
        assert!(ta.test_collision(&a, &overlap, &tb, &b));
        assert!(ta.test_collision(&a, &overlap, &tb, &b));
        assert_eq!(a.builds.load(Ordering::SeqCst), 1);
        assert_eq!(b.builds.load(Ordering::SeqCst), 1);

        ta.invalidate();
        assert!(!ta.has_collision_model());
        assert!(tb.has_collision_model());
        assert!(ta.test_collision(&a, &overlap, &tb, &b));
        assert_eq!(a.builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_self_collision_locks_once() {
        let a = CountingTriangle::new(0.0);
        let ta = CollisionTester::default();
        assert!(ta.test_collision(&a, &Transform::identity(), &ta, &a));
        assert!(!ta.test_collision(&a, &Transform::translation(0.0, 0.0, 5.0), &ta, &a));
    }

    #[test]
    fn test_clone_gets_fresh_identity() {
        let a = CountingTriangle::new(0.0);
        let ta = CollisionTester::default();
        ta.collision_model(&a);
        let copy = ta.clone();
        assert_ne!(copy.id(), ta.id());
        assert!(!copy.has_collision_model());
    }

    #[test]
    fn test_sphere_uses_box_centre() {
        let a = CountingTriangle::new(2.0);
        let sphere = CollisionTester::default().bounding_sphere(&a);
        assert_eq!(sphere.center, Point3d::new(2.5, 0.5, 0.0));
        assert_relative_eq!(sphere.radius, 0.5f64.sqrt(), epsilon = 1e-12);
    }
}
