//! Collision detection settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Distance within which touching surfaces count as intersecting.
    pub contact_tolerance: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            contact_tolerance: 1e-9,
        }
    }
}

impl CollisionConfig {
    /// Exact contact only.
    pub fn precise() -> Self {
        Self {
            contact_tolerance: 0.0,
        }
    }
}
