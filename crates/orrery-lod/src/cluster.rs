use orrery_math::{Aabb, BoundsError, ObjectId, RawBounds};
use serde::{Deserialize, Serialize};

use crate::selector::LodLevel;

/// A unit of renderable geometry as submitted by the scene layer.
///
/// Bounds are carried in their raw form and validated when a batch is
/// processed, so one malformed cluster only drops itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: ObjectId,
    #[serde(default)]
    pub bounds: Option<RawBounds>,
    /// Approximate cost proxy.
    pub triangle_count: u32,
    /// Groups clusters that share a parent mesh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_id: Option<ObjectId>,
}

impl Cluster {
    pub fn new(id: impl Into<ObjectId>, bounds: Aabb, triangle_count: u32) -> Self {
        Self {
            id: id.into(),
            bounds: Some(bounds.into()),
            triangle_count,
            mesh_id: None,
        }
    }

    pub fn with_mesh(mut self, mesh_id: impl Into<ObjectId>) -> Self {
        self.mesh_id = Some(mesh_id.into());
        self
    }

    /// Validated bounds, or why they are unusable.
    pub fn aabb(&self) -> Result<Aabb, BoundsError> {
        self.bounds.ok_or(BoundsError::Missing)?.to_aabb()
    }
}

/// Level chosen for one cluster in one batch. Not retained by the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodResult {
    pub cluster_id: ObjectId,
    #[serde(rename = "selectedLevel")]
    pub level: LodLevel,
    pub error: f64,
    pub triangle_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_missing_bounds() {
        let cluster = Cluster {
            id: ObjectId::from(1u64),
            bounds: None,
            triangle_count: 10,
            mesh_id: None,
        };
        assert_eq!(cluster.aabb(), Err(BoundsError::Missing));
    }

    #[test]
    fn test_cluster_json_shape() {
        let json = r#"{"id":"m31/c7","bounds":{"min":[0,0,0],"max":[1,2,3]},"triangleCount":128,"meshId":3}"#;
        let cluster: Cluster = serde_json::from_str(json).unwrap();
        assert_eq!(cluster.id, ObjectId::from("m31/c7"));
        assert_eq!(cluster.mesh_id, Some(ObjectId::from(3u64)));
        assert_eq!(cluster.aabb().unwrap().max(), DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_cluster_without_bounds_deserializes() {
        let cluster: Cluster = serde_json::from_str(r#"{"id":4,"triangleCount":1}"#).unwrap();
        assert!(cluster.bounds.is_none());
        assert!(cluster.aabb().is_err());
    }

    #[test]
    fn test_lod_result_field_names() {
        let result = LodResult {
            cluster_id: ObjectId::from(9u64),
            level: LodLevel::FINEST,
            error: 0.5,
            triangle_count: 64,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "clusterId": 9,
                "selectedLevel": 4,
                "error": 0.5,
                "triangleCount": 64
            })
        );
    }
}
