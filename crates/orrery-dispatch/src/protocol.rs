//! Request/response messages exchanged with workers.
//!
//! On the wire every message is a JSON object whose `"type"` field carries
//! the tag (`SELECT_LODS`, `LOD_SELECTION_COMPLETE`, ...) and whose remaining
//! fields are the camelCase payload. In-process callers pass the typed enums
//! directly and never touch JSON.

use std::fmt;

use orrery_cull::{CullObject, CullOutcome, FrustumPlane};
use orrery_lod::{Cluster, LodResult};
use orrery_math::CameraState;
use orrery_simplify::SimplifiedMesh;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// The four task kinds a worker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    SelectLods,
    SimplifyGeometry,
    FrustumCull,
    ComputeErrors,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::SelectLods,
        TaskKind::SimplifyGeometry,
        TaskKind::FrustumCull,
        TaskKind::ComputeErrors,
    ];

    /// Wire tag of the request message.
    pub fn request_tag(self) -> &'static str {
        match self {
            TaskKind::SelectLods => "SELECT_LODS",
            TaskKind::SimplifyGeometry => "SIMPLIFY_GEOMETRY",
            TaskKind::FrustumCull => "FRUSTUM_CULL",
            TaskKind::ComputeErrors => "COMPUTE_ERRORS",
        }
    }

    /// Wire tag of the matching completion message.
    pub fn response_tag(self) -> &'static str {
        match self {
            TaskKind::SelectLods => "LOD_SELECTION_COMPLETE",
            TaskKind::SimplifyGeometry => "SIMPLIFICATION_COMPLETE",
            TaskKind::FrustumCull => "FRUSTUM_CULL_COMPLETE",
            TaskKind::ComputeErrors => "ERROR_COMPUTATION_COMPLETE",
        }
    }

    pub fn from_request_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.request_tag() == tag)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.request_tag())
    }
}

// ---------------------------------------------------------------------------
// Top-level enums
// ---------------------------------------------------------------------------

/// A unit of work. Owns all of its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "SELECT_LODS")]
    SelectLods(SelectLods),
    #[serde(rename = "SIMPLIFY_GEOMETRY")]
    SimplifyGeometry(SimplifyGeometry),
    #[serde(rename = "FRUSTUM_CULL")]
    FrustumCull(FrustumCull),
    #[serde(rename = "COMPUTE_ERRORS")]
    ComputeErrors(ComputeErrors),
}

/// Result of one request. Exactly one per accepted request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    #[serde(rename = "LOD_SELECTION_COMPLETE")]
    LodSelectionComplete { results: Vec<LodResult> },
    #[serde(rename = "SIMPLIFICATION_COMPLETE")]
    SimplificationComplete(SimplifiedMesh),
    #[serde(rename = "FRUSTUM_CULL_COMPLETE")]
    FrustumCullComplete(CullOutcome),
    /// Positionally aligned with the request's clusters. Entries for
    /// clusters with unusable bounds are `NaN` (`null` on the wire).
    #[serde(rename = "ERROR_COMPUTATION_COMPLETE")]
    ErrorComputationComplete {
        #[serde(with = "nan_as_null")]
        errors: Vec<f64>,
    },
}

impl Request {
    pub fn kind(&self) -> TaskKind {
        match self {
            Request::SelectLods(_) => TaskKind::SelectLods,
            Request::SimplifyGeometry(_) => TaskKind::SimplifyGeometry,
            Request::FrustumCull(_) => TaskKind::FrustumCull,
            Request::ComputeErrors(_) => TaskKind::ComputeErrors,
        }
    }

    /// Decode a JSON request, telling unknown tags apart from bad payloads.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(DecodeError::MissingTag)?;
        let kind = TaskKind::from_request_tag(tag)
            .ok_or_else(|| DecodeError::UnsupportedTag(tag.to_owned()))?;
        serde_json::from_value(value).map_err(|source| DecodeError::Payload { kind, source })
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Response {
    /// The request kind this response completes.
    pub fn kind(&self) -> TaskKind {
        match self {
            Response::LodSelectionComplete { .. } => TaskKind::SelectLods,
            Response::SimplificationComplete(_) => TaskKind::SimplifyGeometry,
            Response::FrustumCullComplete(_) => TaskKind::FrustumCull,
            Response::ErrorComputationComplete { .. } => TaskKind::ComputeErrors,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Why an incoming JSON message was dropped.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message has no string \"type\" field")]
    MissingTag,

    #[error("unsupported request type {0:?}")]
    UnsupportedTag(String),

    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: TaskKind,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Payload structs
// ---------------------------------------------------------------------------

/// Choose a level for every cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectLods {
    pub clusters: Vec<Cluster>,
    pub camera: CameraState,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub error_threshold: f64,
}

/// Decimate one mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifyGeometry {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub target_ratio: f64,
}

/// Partition objects against six planes (near, far, left, right, top, bottom).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrustumCull {
    pub objects: Vec<CullObject>,
    pub frustum_planes: [FrustumPlane; 6],
}

/// Raw screen-space errors, no level selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeErrors {
    pub clusters: Vec<Cluster>,
    pub camera: CameraState,
    pub viewport_height: u32,
}

/// JSON has no NaN; unusable entries travel as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| (!v.is_nan()).then_some(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_math::ObjectId;

    const SELECT_JSON: &str = r#"{
        "type": "SELECT_LODS",
        "clusters": [
            {"id": 1, "bounds": {"min": [-1, -1, -1], "max": [1, 1, 1]}, "triangleCount": 4000},
            {"id": "far", "bounds": {"min": [-1, -1, -10001], "max": [1, 1, -9999]}, "triangleCount": 4000}
        ],
        "camera": {"position": {"x": 0, "y": 0, "z": 10}, "fieldOfViewDegrees": 60},
        "viewportWidth": 1600,
        "viewportHeight": 1000,
        "errorThreshold": 0.05
    }"#;

    #[test]
    fn test_decode_select_lods() {
        let Request::SelectLods(payload) = Request::decode(SELECT_JSON).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(payload.clusters.len(), 2);
        assert_eq!(payload.clusters[1].id, ObjectId::from("far"));
        assert_eq!(payload.camera.field_of_view_degrees, 60.0);
        assert_eq!(payload.viewport_height, 1000);
    }

    #[test]
    fn test_decode_remaining_request_kinds() {
        let simplify = r#"{"type":"SIMPLIFY_GEOMETRY","vertices":[0,0,0,1,0,0,0,1,0],"indices":[0,1,2],"targetRatio":0.5}"#;
        assert_eq!(Request::decode(simplify).unwrap().kind(), TaskKind::SimplifyGeometry);

        let cull = r#"{"type":"FRUSTUM_CULL","objects":[{"id":7,"bounds":{"min":[0,0,0],"max":[1,1,1]}}],
            "frustumPlanes":[
                {"normal":[0,0,-1],"d":1000},{"normal":[0,0,1],"d":1000},
                {"normal":[1,0,0],"d":1000},{"normal":[-1,0,0],"d":1000},
                {"normal":[0,-1,0],"d":1000},{"normal":[0,1,0],"d":1000}]}"#;
        assert_eq!(Request::decode(cull).unwrap().kind(), TaskKind::FrustumCull);

        let errors = r#"{"type":"COMPUTE_ERRORS","clusters":[],"camera":{"position":{"x":0,"y":0,"z":0},"fieldOfViewDegrees":90},"viewportHeight":720}"#;
        assert_eq!(Request::decode(errors).unwrap().kind(), TaskKind::ComputeErrors);
    }

    #[test]
    fn test_decode_failures_are_classified() {
        assert!(matches!(Request::decode("{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(Request::decode(r#"{"clusters":[]}"#), Err(DecodeError::MissingTag)));
        assert!(matches!(
            Request::decode(r#"{"type":"CANCEL","taskId":3}"#),
            Err(DecodeError::UnsupportedTag(tag)) if tag == "CANCEL"
        ));
        // Five planes instead of six.
        let short = r#"{"type":"FRUSTUM_CULL","objects":[],"frustumPlanes":[
            {"normal":[1,0,0],"d":1},{"normal":[1,0,0],"d":1},{"normal":[1,0,0],"d":1},
            {"normal":[1,0,0],"d":1},{"normal":[1,0,0],"d":1}]}"#;
        assert!(matches!(
            Request::decode(short),
            Err(DecodeError::Payload { kind: TaskKind::FrustumCull, .. })
        ));
    }

    #[test]
    fn test_request_encode_decode() {
        let request = Request::decode(SELECT_JSON).unwrap();
        let text = request.encode().unwrap();
        assert!(text.contains(r#""type":"SELECT_LODS""#));
        assert_eq!(Request::decode(&text).unwrap(), request);
    }

    #[test]
    fn test_error_nan_travels_as_null() {
        let response = Response::ErrorComputationComplete {
            errors: vec![0.5, f64::NAN, 2.0],
        };
        let text = response.encode().unwrap();
        assert_eq!(
            text,
            r#"{"type":"ERROR_COMPUTATION_COMPLETE","errors":[0.5,null,2.0]}"#
        );
        let Response::ErrorComputationComplete { errors } = Response::decode(&text).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(errors[0], 0.5);
        assert!(errors[1].is_nan());
        assert_eq!(errors[2], 2.0);
    }

    #[test]
    fn test_response_tags() {
        let mesh = Response::SimplificationComplete(SimplifiedMesh {
            vertices: vec![0.0; 9],
            indices: vec![0, 1, 2],
        });
        let value: serde_json::Value = serde_json::from_str(&mesh.encode().unwrap()).unwrap();
        assert_eq!(value["type"], "SIMPLIFICATION_COMPLETE");
        assert_eq!(value["indices"], serde_json::json!([0, 1, 2]));

        let cull = Response::FrustumCullComplete(CullOutcome {
            visible: vec![ObjectId::from(1u64)],
            culled: vec![ObjectId::from("x")],
        });
        let value: serde_json::Value = serde_json::from_str(&cull.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "FRUSTUM_CULL_COMPLETE", "visible": [1], "culled": ["x"]})
        );
    }

    #[test]
    fn test_tags_pair_up() {
        for kind in TaskKind::ALL {
            assert_eq!(TaskKind::from_request_tag(kind.request_tag()), Some(kind));
            assert_eq!(TaskKind::from_request_tag(kind.response_tag()), None);
            assert_eq!(kind.to_string(), kind.request_tag());
        }
    }
}
