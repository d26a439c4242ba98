use orrery_math::{ObjectId, RawBounds};
use serde::{Deserialize, Serialize};

use crate::frustum::{Frustum, Intersection};

/// An object submitted for culling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CullObject {
    pub id: ObjectId,
    #[serde(default)]
    pub bounds: Option<RawBounds>,
}

impl CullObject {
    pub fn new(id: impl Into<ObjectId>, bounds: RawBounds) -> Self {
        Self {
            id: id.into(),
            bounds: Some(bounds),
        }
    }
}

/// Partition of a culling batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CullOutcome {
    pub visible: Vec<ObjectId>,
    pub culled: Vec<ObjectId>,
}

/// Partition `objects` into visible and culled ids, preserving input order.
///
/// Every object with valid bounds lands in exactly one list. Objects with
/// missing or invalid bounds land in neither.
pub fn cull_batch(frustum: &Frustum, objects: &[CullObject]) -> CullOutcome {
    let mut outcome = CullOutcome::default();
    let mut skipped = 0usize;
    let mut straddling = 0usize;

    for object in objects {
        let Some(Ok(aabb)) = object.bounds.map(|b| b.to_aabb()) else {
            skipped += 1;
            continue;
        };
        match frustum.classify(&aabb) {
            Intersection::Outside => outcome.culled.push(object.id.clone()),
            Intersection::Intersecting => {
                straddling += 1;
                outcome.visible.push(object.id.clone());
            }
            Intersection::Inside => outcome.visible.push(object.id.clone()),
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, total = objects.len(), "culling skipped objects with invalid bounds");
    }
    tracing::trace!(
        visible = outcome.visible.len(),
        straddling,
        culled = outcome.culled.len(),
        "culled batch"
    );
    outcome
}
