//! Frustum visibility culling of axis-aligned bounds.

mod batch;
mod frustum;

pub use batch::{CullObject, CullOutcome, cull_batch};
pub use frustum::{Frustum, FrustumPlane, Intersection};
