//! f64 bounding boxes, camera and viewport state, and opaque object ids shared by the Orrery crates.

mod aabb;
mod camera;
mod id;
pub mod xyz;

pub use aabb::{Aabb, BoundsError, RawBounds};
pub use camera::{CameraError, CameraState, Viewport};
pub use glam::DVec3;
pub use id::ObjectId;
