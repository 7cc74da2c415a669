//! A set of placed objects that can be queried for collisions.

use geom_kernel::Transform;
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, info, instrument};

use crate::error::{Result, SceneError};
use crate::object::Object3D;

new_key_type! {
    pub struct ObjectId;
}

/// An object and its placement in world coordinates.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub object: Object3D,
    pub transform: Transform,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: SlotMap<ObjectId, SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: Object3D, transform: Transform) -> ObjectId {
        self.objects.insert(SceneObject { object, transform })
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.objects.remove(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    /// Mutable access to an object's geometry. Object mutators invalidate
    /// its collision cache themselves.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id).map(|entry| &mut entry.object)
    }

    pub fn transform(&self, id: ObjectId) -> Option<&Transform> {
        self.objects.get(id).map(|entry| &entry.transform)
    }

    /// Moving an object keeps its cached volumes; they live in the local frame.
    pub fn set_transform(&mut self, id: ObjectId, transform: Transform) -> Result<()> {
        let entry = self.objects.get_mut(id).ok_or(SceneError::UnknownObject(id))?;
        entry.transform = transform;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys()
    }

    fn entry(&self, id: ObjectId) -> Result<&SceneObject> {
        self.objects.get(id).ok_or(SceneError::UnknownObject(id))
    }

    /// Transform taking `b`'s local frame into `a`'s.
    pub fn relative_transform(&self, a: ObjectId, b: ObjectId) -> Result<Transform> {
        let (first, second) = (self.entry(a)?, self.entry(b)?);
        let to_a = first.transform.inverse().ok_or(SceneError::SingularTransform(a))?;
        Ok(to_a.compose(&second.transform))
    }

    /// Whether objects `a` and `b` touch or overlap at their current placements.
    #[instrument(skip(self))]
    pub fn collides(&self, a: ObjectId, b: ObjectId) -> Result<bool> {
        let from_b_to_a = self.relative_transform(a, b)?;
        let hit = self.entry(a)?.object.test_collision(&from_b_to_a, &self.entry(b)?.object);
        debug!(hit, "pair tested");
        Ok(hit)
    }

    /// Every colliding pair, each reported once in iteration order.
    pub fn find_collisions(&self) -> Result<Vec<(ObjectId, ObjectId)>> {
        let ids: Vec<ObjectId> = self.ids().collect();
        let mut pairs = Vec::new();
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                if self.collides(a, b)? {
                    pairs.push((a, b));
                }
            }
        }
        info!(objects = ids.len(), collisions = pairs.len(), "scene collision sweep");
        Ok(pairs)
    }
}
