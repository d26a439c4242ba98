//! Runtime settings for the Orrery worker pool, LOD selection and spatial
//! indexing.
//!
//! Settings persist to disk as `config.ron` and can be overridden from the
//! command line.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, PolarityArg};
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, DispatchConfig, LodConfig, SceneConfig, SpatialConfig,
    default_config_dir,
};
pub use error::ConfigError;
