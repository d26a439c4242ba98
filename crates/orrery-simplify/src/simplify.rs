//! Stride-sampling decimation.
//!
//! This thins the triangle list and nothing else: vertices are copied
//! unchanged and no adjacency is consulted, so the result can have cracks.
//! It is a performance-first approximation, not a quadric-error simplifier.

use serde::{Deserialize, Serialize};

/// Reasons a simplification request is rejected.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SimplifyError {
    #[error("index count {0} is not a multiple of 3")]
    IndexCountNotTriangles(usize),

    #[error("vertex component count {0} is not a multiple of 3")]
    VertexCountNotTriples(usize),

    #[error("target ratio {0} is outside (0, 1]")]
    TargetRatio(f64),

    #[error("index {index} references a vertex past the end ({vertex_count} vertices)")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// A decimated mesh in new buffers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedMesh {
    /// Flat `x, y, z` triples.
    pub vertices: Vec<f32>,
    /// Flat triangle index triples.
    pub indices: Vec<u32>,
}

impl SimplifiedMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Output index count for a source index count and ratio:
/// `floor(index_count * ratio)` rounded down to a multiple of 3.
pub fn target_index_count(index_count: usize, target_ratio: f64) -> usize {
    let scaled = (index_count as f64 * target_ratio).floor() as usize;
    (scaled - scaled % 3).min(index_count)
}

/// Decimate a mesh toward `target_ratio` of its original index count.
///
/// Output triangle `i` is source triangle `floor(i * total / target)`: a
/// uniform stride walk that always yields exactly the target count. The
/// input buffers are not modified.
pub fn simplify(
    vertices: &[f32],
    indices: &[u32],
    target_ratio: f64,
) -> Result<SimplifiedMesh, SimplifyError> {
    if indices.len() % 3 != 0 {
        return Err(SimplifyError::IndexCountNotTriangles(indices.len()));
    }
    if vertices.len() % 3 != 0 {
        return Err(SimplifyError::VertexCountNotTriples(vertices.len()));
    }
    if !(target_ratio > 0.0 && target_ratio <= 1.0) {
        return Err(SimplifyError::TargetRatio(target_ratio));
    }
    let vertex_count = vertices.len() / 3;
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(SimplifyError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }

    let total = indices.len() / 3;
    let target = target_index_count(indices.len(), target_ratio) / 3;

    let mut out = Vec::with_capacity(target * 3);
    for i in 0..target {
        let source = (i as u128 * total as u128 / target as u128) as usize;
        out.extend_from_slice(&indices[source * 3..source * 3 + 3]);
    }

    Ok(SimplifiedMesh {
        vertices: vertices.to_vec(),
        indices: out,
    })
}
