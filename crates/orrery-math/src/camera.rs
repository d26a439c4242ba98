//! Camera and viewport state supplied by the navigation layer each query.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Camera or viewport values the projection cannot work with.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CameraError {
    /// Field of view must lie strictly between 0 and 180 degrees.
    #[error("field of view {0} degrees is outside (0, 180)")]
    FieldOfView(f64),

    /// Camera position has a NaN or infinite component.
    #[error("camera position is not finite")]
    NonFinitePosition,

    /// Viewport has a zero dimension.
    #[error("viewport {width}x{height} has a zero dimension")]
    EmptyViewport { width: u32, height: u32 },

    /// A height-only query was given a zero height.
    #[error("viewport height is zero")]
    ZeroViewportHeight,
}

/// Camera pose as needed by the error estimator.
///
/// Owned by the camera collaborator and passed by value; nothing in the
/// core mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    /// World-space position, serialized as `{x, y, z}`.
    #[serde(with = "crate::xyz")]
    pub position: DVec3,
    /// Vertical field of view in degrees.
    pub field_of_view_degrees: f64,
}

impl CameraState {
    pub fn new(position: DVec3, field_of_view_degrees: f64) -> Self {
        Self {
            position,
            field_of_view_degrees,
        }
    }

    /// Check the pose can drive a perspective projection.
    pub fn validate(&self) -> Result<(), CameraError> {
        if !self.position.is_finite() {
            return Err(CameraError::NonFinitePosition);
        }
        let fov = self.field_of_view_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(CameraError::FieldOfView(fov));
        }
        Ok(())
    }

    /// Vertical field of view in radians.
    pub fn fov_radians(&self) -> f64 {
        self.field_of_view_degrees.to_radians()
    }

    /// Pixels per unit of (world size / distance) for a pinhole camera:
    /// `viewport_height / (2 * tan(fov / 2))`.
    pub fn projection_scale(&self, viewport_height: f64) -> f64 {
        viewport_height / (2.0 * (self.fov_radians() * 0.5).tan())
    }
}

/// Render target size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Create a viewport, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::EmptyViewport { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}
