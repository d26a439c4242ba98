//! Seeded synthetic scene: scattered clusters, a grid over them, a camera
//! fly-through, and a test mesh for the simplifier.

use glam::{DMat4, DVec3};
use orrery_config::SceneConfig;
use orrery_cull::{CullObject, Frustum};
use orrery_lod::Cluster;
use orrery_math::{Aabb, CameraState, RawBounds, Viewport};
use orrery_spatial::{GridError, SpatialGrid};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// Clusters sharing a parent mesh id.
const CLUSTERS_PER_MESH: u64 = 16;

const NEAR_PLANE: f64 = 1.0;

pub struct Scene {
    pub clusters: Vec<Cluster>,
    /// Cluster centers keyed by index into `clusters`.
    pub grid: SpatialGrid<usize>,
    pub extent: f64,
}

impl Scene {
    pub fn generate(config: &SceneConfig, cell_size: f64) -> Result<Self, GridError> {
        let mut rng = Xoshiro256StarStar::seed_from_u64(config.seed);
        let extent = config.extent.abs().max(1.0);

        let mut clusters = Vec::with_capacity(config.cluster_count);
        for i in 0..config.cluster_count as u64 {
            let center = DVec3::new(
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
            );
            let half = DVec3::new(
                rng.gen_range(5.0..200.0),
                rng.gen_range(5.0..200.0),
                rng.gen_range(5.0..200.0),
            );
            let Ok(bounds) = Aabb::from_center_half_extents(center, half) else {
                continue;
            };
            let triangles = rng.gen_range(64..=8192);
            clusters.push(Cluster::new(i, bounds, triangles).with_mesh(i / CLUSTERS_PER_MESH));
        }

        let grid = SpatialGrid::build(
            cell_size,
            clusters.iter().enumerate().filter_map(|(index, cluster)| {
                cluster.aabb().ok().map(|bounds| (index, bounds.center()))
            }),
        )?;

        Ok(Self {
            clusters,
            grid,
            extent,
        })
    }

    /// Clusters whose centers lie within `radius` of `center`.
    pub fn candidates(&self, center: DVec3, radius: f64) -> Result<Vec<Cluster>, GridError> {
        Ok(self
            .grid
            .query_radius_exact(center, radius)?
            .into_iter()
            .map(|entry| self.clusters[entry.key].clone())
            .collect())
    }
}

/// Camera flying along -Z through the scene; `t` runs from 0 to 1.
pub fn camera_at(extent: f64, t: f64) -> CameraState {
    let z = extent * (1.0 - 2.0 * t.clamp(0.0, 1.0));
    CameraState::new(DVec3::new(0.0, 0.0, z), 60.0)
}

/// Frustum for a camera looking down -Z.
pub fn frustum_for(camera: &CameraState, viewport: Viewport, far: f64) -> Frustum {
    let view = DMat4::look_at_rh(camera.position, camera.position - DVec3::Z, DVec3::Y);
    let proj = DMat4::perspective_rh(
        camera.fov_radians(),
        viewport.aspect_ratio(),
        NEAR_PLANE,
        far.max(NEAR_PLANE * 2.0),
    );
    Frustum::from_view_projection(&(proj * view))
}

pub fn cull_objects(clusters: &[Cluster]) -> Vec<CullObject> {
    clusters
        .iter()
        .filter_map(|cluster| {
            let bounds: RawBounds = cluster.bounds?;
            Some(CullObject::new(cluster.id.clone(), bounds))
        })
        .collect()
}

/// A flat `n x n` quad grid: `(n + 1)^2` vertices, `2 n^2` triangles.
pub fn grid_mesh(n: u32) -> (Vec<f32>, Vec<u32>) {
    let side = n + 1;
    let mut vertices = Vec::with_capacity((side * side * 3) as usize);
    for y in 0..side {
        for x in 0..side {
            vertices.extend_from_slice(&[x as f32, y as f32, 0.0]);
        }
    }

    let mut indices = Vec::with_capacity((n * n * 6) as usize);
    for y in 0..n {
        for x in 0..n {
            let i = y * side + x;
            indices.extend_from_slice(&[i, i + 1, i + side, i + 1, i + side + 1, i + side]);
        }
    }
    (vertices, indices)
}
