//! Fast triangle-mesh decimation by uniform stride sampling.

mod adjacency;
mod simplify;

pub use adjacency::VertexAdjacency;
pub use simplify::{SimplifiedMesh, SimplifyError, simplify, target_index_count};
