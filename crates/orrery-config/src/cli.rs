//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use orrery_lod::ErrorPolarity;

use crate::Config;

/// Orrery command-line arguments.
///
/// Command-line flags; any flag given wins over `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "orrery", about = "Off-thread visibility and LOD core")]
pub struct CliArgs {
    /// Worker threads (0 = auto).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Maximum in-flight requests.
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Screen-space error threshold in pixels.
    #[arg(long)]
    pub error_threshold: Option<f64>,

    /// Whether larger error coarsens or refines.
    #[arg(long, value_enum)]
    pub polarity: Option<PolarityArg>,

    /// Spatial grid cell size in world units.
    #[arg(long)]
    pub cell_size: Option<f64>,

    /// Number of clusters in the synthetic scene.
    #[arg(long)]
    pub clusters: Option<usize>,

    /// Scene generator seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Log filter directives, e.g. `debug` or `warn,orrery_cull=trace`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory holding `config.ron` instead of the platform default.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Command-line spelling of [`ErrorPolarity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolarityArg {
    Coarsen,
    Refine,
}

impl From<PolarityArg> for ErrorPolarity {
    fn from(arg: PolarityArg) -> Self {
        match arg {
            PolarityArg::Coarsen => ErrorPolarity::CoarsenOnError,
            PolarityArg::Refine => ErrorPolarity::RefineOnError,
        }
    }
}

impl Config {
    /// Overwrite every field that has a matching flag set in `args`.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(workers) = args.workers {
            self.dispatch.worker_count = workers;
        }
        if let Some(budget) = args.max_in_flight {
            self.dispatch.max_in_flight = budget;
        }
        if let Some(threshold) = args.error_threshold {
            self.lod.error_threshold = threshold;
        }
        if let Some(polarity) = args.polarity {
            self.lod.polarity = polarity.into();
        }
        if let Some(cell_size) = args.cell_size {
            self.spatial.cell_size = cell_size;
        }
        if let Some(clusters) = args.clusters {
            self.scene.cluster_count = clusters;
        }
        if let Some(seed) = args.seed {
            self.scene.seed = seed;
        }
        if let Some(frames) = args.frames {
            self.scene.frames = frames;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs::parse_from([
            "orrery",
            "--workers",
            "3",
            "--polarity",
            "refine",
            "--error-threshold",
            "0.05",
        ]);
        config.apply_cli_overrides(&args);
        assert_eq!(config.dispatch.worker_count, 3);
        assert_eq!(config.lod.polarity, ErrorPolarity::RefineOnError);
        assert_eq!(config.lod.error_threshold, 0.05);
        // untouched
        assert_eq!(config.dispatch.max_in_flight, 64);
        assert_eq!(config.spatial.cell_size, 1000.0);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        let args = CliArgs::parse_from(["orrery"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config, original);
    }

    #[test]
    fn test_unknown_polarity_rejected() {
        assert!(CliArgs::try_parse_from(["orrery", "--polarity", "sideways"]).is_err());
    }
}
