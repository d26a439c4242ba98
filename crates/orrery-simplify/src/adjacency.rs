//! Vertex-to-triangle adjacency in compressed (offset + list) form.
//!
//! Stride sampling does not need it; it is the starting point for
//! adjacency-aware decimation.

use crate::simplify::SimplifyError;

/// For each vertex, the triangles that reference it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexAdjacency {
    /// `offsets[v]..offsets[v + 1]` is the slice of `triangles` for vertex `v`.
    offsets: Vec<u32>,
    triangles: Vec<u32>,
}

impl VertexAdjacency {
    /// Build the map for `vertex_count` vertices from a triangle index list.
    pub fn build(indices: &[u32], vertex_count: usize) -> Result<Self, SimplifyError> {
        if indices.len() % 3 != 0 {
            return Err(SimplifyError::IndexCountNotTriangles(indices.len()));
        }

        let mut counts = vec![0u32; vertex_count + 1];
        for &index in indices {
            let slot = counts
                .get_mut(index as usize)
                .filter(|_| (index as usize) < vertex_count)
                .ok_or(SimplifyError::IndexOutOfRange {
                    index,
                    vertex_count,
                })?;
            *slot += 1;
        }

        // Exclusive prefix sum into offsets.
        let mut offsets = Vec::with_capacity(vertex_count + 1);
        let mut running = 0u32;
        for &count in &counts[..vertex_count] {
            offsets.push(running);
            running += count;
        }
        offsets.push(running);

        let mut cursor = offsets.clone();
        let mut triangles = vec![0u32; indices.len()];
        for (triangle, corners) in indices.chunks_exact(3).enumerate() {
            for &vertex in corners {
                let at = &mut cursor[vertex as usize];
                triangles[*at as usize] = triangle as u32;
                *at += 1;
            }
        }

        Ok(Self { offsets, triangles })
    }

    pub fn vertex_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Triangles referencing `vertex`, in ascending order. Empty for
    /// unreferenced or out-of-range vertices.
    pub fn triangles_of(&self, vertex: usize) -> &[u32] {
        if vertex >= self.vertex_count() {
            return &[];
        }
        let start = self.offsets[vertex] as usize;
        let end = self.offsets[vertex + 1] as usize;
        &self.triangles[start..end]
    }
}
