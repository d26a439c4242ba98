//! Level-of-detail selection driven by projected screen-space error.

mod batch;
mod cluster;
mod error;
mod selector;

pub use batch::{compute_errors, select_lods};
pub use cluster::{Cluster, LodResult};
pub use error::{ErrorEstimate, MIN_DISTANCE, estimate_error, screen_space_error};
pub use selector::{ErrorPolarity, LodBands, LodBandsError, LodLevel, LodSelector};
