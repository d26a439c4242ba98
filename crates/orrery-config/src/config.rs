//! Settings sections, their defaults, and the `config.ron` file they live in.

use std::path::{Path, PathBuf};

use orrery_lod::{ErrorPolarity, LodBands, LodSelector};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Worker pool settings.
    pub dispatch: DispatchConfig,
    /// Level-of-detail selection settings.
    pub lod: LodConfig,
    /// Spatial index settings.
    pub spatial: SpatialConfig,
    /// Synthetic scene used by the demo driver.
    pub scene: SceneConfig,
    /// Diagnostics.
    pub debug: DebugConfig,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Worker threads (0 = one per core, minus the calling thread).
    pub worker_count: usize,
    /// Maximum requests queued or executing at once.
    pub max_in_flight: usize,
}

/// LOD selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Screen-space error threshold in pixels.
    pub error_threshold: f64,
    /// Band factors applied to the threshold, strictly increasing.
    pub bands: [f64; 4],
    /// Whether a larger error selects a coarser or a finer level.
    pub polarity: ErrorPolarity,
}

/// Spatial index configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpatialConfig {
    /// Edge length of one grid cell in world units.
    pub cell_size: f64,
}

/// Synthetic scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Number of clusters scattered through the scene.
    pub cluster_count: usize,
    /// Half-width of the cube the clusters are scattered in.
    pub extent: f64,
    /// Seed for the scene generator.
    pub seed: u64,
    /// Frames to simulate.
    pub frames: u32,
}

/// Diagnostics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// `tracing` filter directives, e.g. `"warn,orrery_dispatch=debug"`.
    pub log_level: String,
}

// --- Defaults ---

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            max_in_flight: 64,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            error_threshold: 1.0,
            bands: *LodBands::default().factors(),
            polarity: ErrorPolarity::default(),
        }
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { cell_size: 1000.0 }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            cluster_count: 20_000,
            extent: 50_000.0,
            seed: 42,
            frames: 3,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl LodConfig {
    /// Build the selector these settings describe.
    pub fn selector(&self) -> Result<LodSelector, ConfigError> {
        if !(self.error_threshold.is_finite() && self.error_threshold > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "lod.error_threshold",
                reason: format!("{} is not a positive finite number", self.error_threshold),
            });
        }
        let bands = LodBands::custom(self.bands).map_err(|e| ConfigError::InvalidValue {
            field: "lod.bands",
            reason: e.to_string(),
        })?;
        Ok(LodSelector::new(bands, self.polarity))
    }
}

impl SpatialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_size.is_finite() && self.cell_size > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                field: "spatial.cell_size",
                reason: format!("{} is not a positive finite number", self.cell_size),
            })
        }
    }
}

/// Platform config directory for Orrery, or the working directory if the
/// platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|base| base.join("orrery"))
        .unwrap_or_else(|| PathBuf::from("."))
}

// --- Persistence ---

/// File name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ron::from_str(&contents)?)
}

impl Config {
    /// Load `config.ron` from `config_dir`, writing the defaults there first
    /// if the file does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let config = read_config(&path)?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check every value that has a domain narrower than its type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lod.selector()?;
        self.spatial.validate()
    }

    /// Write `config.ron` into `config_dir`, creating the directory if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        let write_failed = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty)?;

        std::fs::create_dir_all(config_dir).map_err(write_failed)?;
        std::fs::write(&path, text).map_err(write_failed)
    }

    /// Re-read the file. `Some` carries the new settings only when they differ
    /// from `self` and pass validation.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = read_config(&config_dir.join(CONFIG_FILE_NAME))?;
        if fresh == *self {
            return Ok(None);
        }
        fresh.validate()?;
        log::info!("Config changed on disk");
        Ok(Some(fresh))
    }
}
