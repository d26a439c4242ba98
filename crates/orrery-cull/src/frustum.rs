//! Six-plane view frustum and AABB tests.
//!
//! Planes follow the convention `n·x + d >= 0` is inside. The camera
//! collaborator derives them; the culler treats them as opaque.

use glam::{DMat4, DVec3, DVec4};
use orrery_math::Aabb;
use serde::{Deserialize, Serialize};

/// Plane indices into [`Frustum::planes`].
const NEAR: usize = 0;
const FAR: usize = 1;
const LEFT: usize = 2;
const RIGHT: usize = 3;
const TOP: usize = 4;
const BOTTOM: usize = 5;

/// Result of testing an AABB against the frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    /// The box is entirely inside the frustum.
    Inside,
    /// The box is entirely outside at least one plane.
    Outside,
    /// The box straddles one or more frustum planes.
    Intersecting,
}

/// A half-space `normal·x + d >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrustumPlane {
    pub normal: [f64; 3],
    pub d: f64,
}

impl FrustumPlane {
    pub fn new(normal: DVec3, d: f64) -> Self {
        Self {
            normal: normal.to_array(),
            d,
        }
    }

    pub fn normal(&self) -> DVec3 {
        DVec3::from_array(self.normal)
    }

    /// Positive if inside, negative if outside, zero on the plane.
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal().dot(point) + self.d
    }

    /// Corner of `aabb` furthest along the normal.
    fn positive_vertex(&self, aabb: &Aabb) -> DVec3 {
        let n = self.normal();
        let (min, max) = (aabb.min(), aabb.max());
        DVec3::new(
            if n.x > 0.0 { max.x } else { min.x },
            if n.y > 0.0 { max.y } else { min.y },
            if n.z > 0.0 { max.z } else { min.z },
        )
    }

    /// Corner of `aabb` furthest against the normal.
    fn negative_vertex(&self, aabb: &Aabb) -> DVec3 {
        let n = self.normal();
        let (min, max) = (aabb.min(), aabb.max());
        DVec3::new(
            if n.x > 0.0 { min.x } else { max.x },
            if n.y > 0.0 { min.y } else { max.y },
            if n.z > 0.0 { min.z } else { max.z },
        )
    }

    fn from_vec4(v: DVec4) -> Self {
        let len = v.truncate().length();
        let v = if len > 0.0 { v / len } else { v };
        Self::new(v.truncate(), v.w)
    }
}

/// A view frustum: near, far, left, right, top, bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    pub planes: [FrustumPlane; 6],
}

impl Frustum {
    pub fn new(planes: [FrustumPlane; 6]) -> Self {
        Self { planes }
    }

    /// Extract normalized planes from a combined view-projection matrix
    /// (Griggs-Hartmann), for projections mapping depth to `[0, 1]` such as
    /// [`DMat4::perspective_rh`].
    pub fn from_view_projection(vp: &DMat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [DVec4::ZERO; 6];
        planes[NEAR] = rows[2];
        planes[FAR] = rows[3] - rows[2];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[TOP] = rows[3] - rows[1];
        planes[BOTTOM] = rows[3] + rows[1];

        Self::new(planes.map(FrustumPlane::from_vec4))
    }

    /// Test whether an AABB is at least partially inside the frustum.
    pub fn is_visible(&self, aabb: &Aabb) -> bool {
        self.classify(aabb) != Intersection::Outside
    }

    /// Classify an AABB against all six planes.
    ///
    /// p-vertex test: if the corner furthest along a plane's normal is
    /// behind that plane, the whole box is outside and testing stops.
    /// Conservative, so boxes near frustum corners may be kept even though
    /// they are outside, but a visible box is never rejected. The n-vertex
    /// separates `Inside` from `Intersecting`.
    pub fn classify(&self, aabb: &Aabb) -> Intersection {
        let mut all_inside = true;
        for plane in &self.planes {
            if plane.signed_distance(plane.positive_vertex(aabb)) < 0.0 {
                return Intersection::Outside;
            }
            if plane.signed_distance(plane.negative_vertex(aabb)) < 0.0 {
                all_inside = false;
            }
        }
        if all_inside {
            Intersection::Inside
        } else {
            Intersection::Intersecting
        }
    }
}
