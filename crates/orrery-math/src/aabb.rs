use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Reasons a pair of corners cannot form a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum BoundsError {
    /// No bounds were supplied.
    #[error("bounds are missing")]
    Missing,

    /// A corner has a NaN or infinite component.
    #[error("bounds contain a non-finite component")]
    NonFinite,

    /// `min` exceeds `max` on one axis.
    #[error("bounds min exceeds max on the {axis} axis ({min} > {max})")]
    Inverted { axis: char, min: f64, max: f64 },

    /// Corners are finite but the box's size or diagonal overflows `f64`.
    #[error("bounds are too large to measure")]
    Overflow,
}

/// Axis-Aligned Bounding Box in f64 world space.
///
/// Invariant: every component is finite, `min <= max` on every axis, and the
/// diagonal length is finite.
/// Unlike a sorting constructor, [`Aabb::new`] rejects inverted corners
/// rather than repairing them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    min: DVec3,
    max: DVec3,
}

impl Aabb {
    /// Create an AABB from its minimum and maximum corners.
    pub fn new(min: DVec3, max: DVec3) -> Result<Self, BoundsError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(BoundsError::NonFinite);
        }
        for (axis, lo, hi) in [('x', min.x, max.x), ('y', min.y, max.y), ('z', min.z, max.z)] {
            if lo > hi {
                return Err(BoundsError::Inverted {
                    axis,
                    min: lo,
                    max: hi,
                });
            }
        }
        if !(max - min).length().is_finite() {
            return Err(BoundsError::Overflow);
        }
        Ok(Self { min, max })
    }

    /// Create an AABB from a center point and non-negative half-extents.
    pub fn from_center_half_extents(center: DVec3, half: DVec3) -> Result<Self, BoundsError> {
        Self::new(center - half, center + half)
    }

    /// Minimum corner.
    pub fn min(&self) -> DVec3 {
        self.min
    }

    /// Maximum corner.
    pub fn max(&self) -> DVec3 {
        self.max
    }

    /// Midpoint of the two corners.
    pub fn center(&self) -> DVec3 {
        self.min * 0.5 + self.max * 0.5
    }

    /// Extent along each axis (`max - min`).
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Euclidean length of the main diagonal.
    pub fn diagonal_length(&self) -> f64 {
        self.size().length()
    }
}

/// Bounds as they arrive from a caller: two corners, not yet validated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawBounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl RawBounds {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Validate into an [`Aabb`].
    pub fn to_aabb(&self) -> Result<Aabb, BoundsError> {
        Aabb::new(DVec3::from_array(self.min), DVec3::from_array(self.max))
    }
}

impl From<Aabb> for RawBounds {
    fn from(aabb: Aabb) -> Self {
        Self {
            min: aabb.min.to_array(),
            max: aabb.max.to_array(),
        }
    }
}

impl TryFrom<RawBounds> for Aabb {
    type Error = BoundsError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        raw.to_aabb()
    }
}
