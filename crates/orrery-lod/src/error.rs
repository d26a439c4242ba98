//! Screen-space error estimation for a single cluster.
//!
//! The metric is a cheap, monotonic ordering signal rather than a geometric
//! error bound: the cluster's diagonal is projected through a pinhole camera
//! to pixels and then divided by the square root of its triangle count.

use orrery_math::{Aabb, CameraState};

/// Distances below this are treated as the camera sitting on the cluster
/// center. The denominator is clamped to this value.
pub const MIN_DISTANCE: f64 = 1e-6;

/// Result of projecting one cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorEstimate {
    /// Projected error, `screen_size / sqrt(max(1, triangles))`. Always finite and >= 0.
    pub error: f64,
    /// Camera-to-center distance after clamping to [`MIN_DISTANCE`].
    pub distance: f64,
    /// The unclamped distance was below [`MIN_DISTANCE`].
    pub degenerate: bool,
}

/// Estimate the screen-space error of a cluster.
///
/// `viewport_height` is in pixels. The camera is assumed valid; see
/// [`CameraState::validate`].
pub fn estimate_error(
    bounds: &Aabb,
    triangle_count: u32,
    camera: &CameraState,
    viewport_height: f64,
) -> ErrorEstimate {
    let raw_distance = camera.position.distance(bounds.center());
    let degenerate = raw_distance < MIN_DISTANCE;
    let distance = raw_distance.max(MIN_DISTANCE);

    let size = bounds.diagonal_length();
    let screen_size = (size / distance) * camera.projection_scale(viewport_height);
    let error = screen_size / f64::from(triangle_count.max(1)).sqrt();
    // Huge boxes near the camera overflow to +inf; a point box under an
    // infinite projection scale gives 0 * inf.
    let error = if error.is_nan() { 0.0 } else { error.min(f64::MAX) };

    ErrorEstimate {
        error,
        distance,
        degenerate,
    }
}

/// Shorthand for [`estimate_error`] returning only the error value.
pub fn screen_space_error(
    bounds: &Aabb,
    triangle_count: u32,
    camera: &CameraState,
    viewport_height: f64,
) -> f64 {
    estimate_error(bounds, triangle_count, camera, viewport_height).error
}
