//! Configuration for the triangulator.

use geom_kernel::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriangulationError};

/// Rule deciding which regions enclosed by an outline's contours are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    /// A region is filled when it is enclosed by an odd number of contours.
    #[default]
    EvenOdd,
    /// A region is filled when the contours' winding number around it is non-zero.
    NonZero,
}

impl FillRule {
    pub fn is_filled(&self, winding: i32) -> bool {
        match self {
            FillRule::EvenOdd => winding % 2 != 0,
            FillRule::NonZero => winding != 0,
        }
    }
}

impl From<FillRule> for lyon_tessellation::FillRule {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::EvenOdd => lyon_tessellation::FillRule::EvenOdd,
            FillRule::NonZero => lyon_tessellation::FillRule::NonZero,
        }
    }
}

/// Settings retained by a triangulator between `triangulate` calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangulatorConfig {
    /// Maximum distance between a curved segment and its polyline approximation.
    pub flatness: f64,
    /// Assumed normal of the outline. `None` infers it from the contours.
    pub normal: Option<Vec3>,
    pub fill_rule: FillRule,
}

impl Default for TriangulatorConfig {
    fn default() -> Self {
        Self {
            flatness: 0.01,
            normal: None,
            fill_rule: FillRule::EvenOdd,
        }
    }
}

impl TriangulatorConfig {
    /// Few segments per curve, for previews and broad-phase geometry.
    pub fn coarse() -> Self {
        Self {
            flatness: 0.5,
            ..Self::default()
        }
    }

    /// Tight curve approximation.
    pub fn fine() -> Self {
        Self {
            flatness: 0.001,
            ..Self::default()
        }
    }

    pub fn with_flatness(flatness: f64) -> Self {
        Self {
            flatness,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.flatness.is_finite() && self.flatness > 0.0) {
            return Err(TriangulationError::InvalidFlatness(self.flatness));
        }
        if let Some(normal) = self.normal {
            if normal.z == 0.0 || !normal.z.is_finite() {
                return Err(TriangulationError::DegenerateNormal);
            }
        }
        Ok(())
    }
}
