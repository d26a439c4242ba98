//! Whole-batch operations over a frame's live cluster set.

use orrery_math::{CameraError, CameraState, Viewport};

use crate::cluster::{Cluster, LodResult};
use crate::error::{estimate_error, screen_space_error};
use crate::selector::LodSelector;

/// Select a level for every cluster with usable bounds.
///
/// Clusters with missing or invalid bounds produce no result. Output order
/// follows input order. Fails only if the camera cannot drive a projection.
pub fn select_lods(
    selector: &LodSelector,
    clusters: &[Cluster],
    camera: &CameraState,
    viewport: Viewport,
    error_threshold: f64,
) -> Result<Vec<LodResult>, CameraError> {
    camera.validate()?;
    Viewport::new(viewport.width, viewport.height)?;
    let height = f64::from(viewport.height);

    let results = clusters
        .iter()
        .filter_map(|cluster| {
            let bounds = cluster.aabb().ok()?;
            let estimate = estimate_error(&bounds, cluster.triangle_count, camera, height);
            Some(LodResult {
                cluster_id: cluster.id.clone(),
                level: selector.select(&estimate, error_threshold),
                error: estimate.error,
                triangle_count: cluster.triangle_count,
            })
        })
        .collect();
    Ok(results)
}

/// Raw errors, one per input cluster in input order.
///
/// A cluster with missing or invalid bounds yields `NaN` at its position;
/// callers must filter non-finite values before use.
pub fn compute_errors(
    clusters: &[Cluster],
    camera: &CameraState,
    viewport_height: u32,
) -> Result<Vec<f64>, CameraError> {
    camera.validate()?;
    if viewport_height == 0 {
        return Err(CameraError::ZeroViewportHeight);
    }
    let height = f64::from(viewport_height);

    Ok(clusters
        .iter()
        .map(|cluster| match cluster.aabb() {
            Ok(bounds) => screen_space_error(&bounds, cluster.triangle_count, camera, height),
            Err(_) => f64::NAN,
        })
        .collect())
}
