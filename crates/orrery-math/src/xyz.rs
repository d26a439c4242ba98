//! Serde adapter that writes a [`DVec3`] as an `{x, y, z}` object.
//!
//! Use with `#[serde(with = "orrery_math::xyz")]`.

use glam::DVec3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
struct Xyz {
    x: f64,
    y: f64,
    z: f64,
}

pub fn serialize<S: Serializer>(v: &DVec3, serializer: S) -> Result<S::Ok, S::Error> {
    Xyz {
        x: v.x,
        y: v.y,
        z: v.z,
    }
    .serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DVec3, D::Error> {
    let p = Xyz::deserialize(deserializer)?;
    Ok(DVec3::new(p.x, p.y, p.z))
}
