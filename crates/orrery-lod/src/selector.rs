//! Error-band LOD classification.
//!
//! Levels run from 0 (coarsest) to 4 (finest). A projected error is compared
//! against multiples of a caller-supplied threshold; by default a smaller
//! error selects a finer level and a larger error a coarser one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ErrorEstimate;

/// A discrete detail tier, `0..=4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LodLevel(u8);

impl LodLevel {
    /// Cheapest geometry.
    pub const COARSEST: LodLevel = LodLevel(0);
    /// Most detailed geometry.
    pub const FINEST: LodLevel = LodLevel(4);
    /// Number of distinct levels.
    pub const COUNT: usize = 5;

    /// Returns `None` if `level` is above [`LodLevel::FINEST`].
    pub fn new(level: u8) -> Option<Self> {
        (level <= Self::FINEST.0).then_some(Self(level))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// The level at the same distance from the opposite end of the range.
    pub fn mirrored(self) -> Self {
        Self(Self::FINEST.0 - self.0)
    }
}

impl fmt::Display for LodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LOD{}", self.0)
    }
}

/// Invalid band factors.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum LodBandsError {
    #[error("band factor {0} must be positive and finite")]
    NonPositive(f64),

    #[error("band factors must be strictly increasing ({previous} >= {next})")]
    NotIncreasing { previous: f64, next: f64 },
}

/// Multiplicative band edges against the error threshold.
///
/// `factors[i]` is the upper (exclusive) edge of the band that maps to level
/// `4 - i`; anything at or above the last edge maps to level 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodBands {
    factors: [f64; 4],
}

impl Default for LodBands {
    /// `0.25, 0.5, 1.0, 2.0` times the threshold.
    fn default() -> Self {
        Self {
            factors: [0.25, 0.5, 1.0, 2.0],
        }
    }
}

impl LodBands {
    /// Create custom band edges. They must be positive and strictly increasing.
    pub fn custom(factors: [f64; 4]) -> Result<Self, LodBandsError> {
        for (i, &f) in factors.iter().enumerate() {
            if !(f.is_finite() && f > 0.0) {
                return Err(LodBandsError::NonPositive(f));
            }
            if i > 0 && f <= factors[i - 1] {
                return Err(LodBandsError::NotIncreasing {
                    previous: factors[i - 1],
                    next: f,
                });
            }
        }
        Ok(Self { factors })
    }

    pub fn factors(&self) -> &[f64; 4] {
        &self.factors
    }
}

/// Which way a growing error moves the selected level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolarity {
    /// Larger error selects a coarser level (`error < 0.25t` is level 4).
    #[default]
    CoarsenOnError,
    /// Larger error selects a finer level (the mirror image of the above).
    RefineOnError,
}

/// Classifies projected errors into [`LodLevel`]s.
#[derive(Clone, Debug, Default)]
pub struct LodSelector {
    bands: LodBands,
    polarity: ErrorPolarity,
}

impl LodSelector {
    pub fn new(bands: LodBands, polarity: ErrorPolarity) -> Self {
        Self { bands, polarity }
    }

    /// Map an error value to a level using the band edges scaled by `threshold`.
    ///
    /// A NaN error or a non-positive threshold never falls below an edge and
    /// lands in the last band.
    pub fn classify(&self, error: f64, threshold: f64) -> LodLevel {
        let mut level = LodLevel::COARSEST;
        for (i, &factor) in self.bands.factors.iter().enumerate() {
            if error < factor * threshold {
                level = LodLevel(LodLevel::FINEST.0 - i as u8);
                break;
            }
        }
        match self.polarity {
            ErrorPolarity::CoarsenOnError => level,
            ErrorPolarity::RefineOnError => level.mirrored(),
        }
    }

    /// Select a level for an estimate. A camera sitting on the cluster center
    /// always gets full detail.
    pub fn select(&self, estimate: &ErrorEstimate, threshold: f64) -> LodLevel {
        if estimate.degenerate {
            return LodLevel::FINEST;
        }
        self.classify(estimate.error, threshold)
    }

    pub fn bands(&self) -> &LodBands {
        &self.bands
    }

    pub fn polarity(&self) -> ErrorPolarity {
        self.polarity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::estimate_error;
    use glam::DVec3;
    use orrery_math::{Aabb, CameraState};

    fn literal() -> LodSelector {
        LodSelector::default()
    }

    fn refine() -> LodSelector {
        LodSelector::new(LodBands::default(), ErrorPolarity::RefineOnError)
    }

    /// Band edges are exclusive and follow the documented table.
    #[test]
    fn test_literal_band_table() {
        let s = literal();
        let t = 1.0;
        assert_eq!(s.classify(0.0, t).value(), 4);
        assert_eq!(s.classify(0.2499, t).value(), 4);
        assert_eq!(s.classify(0.25, t).value(), 3);
        assert_eq!(s.classify(0.4999, t).value(), 3);
        assert_eq!(s.classify(0.5, t).value(), 2);
        assert_eq!(s.classify(0.9999, t).value(), 2);
        assert_eq!(s.classify(1.0, t).value(), 1);
        assert_eq!(s.classify(1.9999, t).value(), 1);
        assert_eq!(s.classify(2.0, t).value(), 0);
        assert_eq!(s.classify(1.0e9, t).value(), 0);
    }

    #[test]
    fn test_bands_scale_with_threshold() {
        let s = literal();
        assert_eq!(s.classify(0.01, 0.05).value(), 4);
        assert_eq!(s.classify(0.02, 0.05).value(), 3);
        assert_eq!(s.classify(0.04, 0.05).value(), 2);
        assert_eq!(s.classify(0.09, 0.05).value(), 1);
        assert_eq!(s.classify(0.10, 0.05).value(), 0);
    }

    #[test]
    fn test_refine_polarity_mirrors_levels() {
        let lit = literal();
        let mirror = refine();
        for error in [0.0, 0.3, 0.7, 1.5, 3.0] {
            assert_eq!(
                mirror.classify(error, 1.0).value(),
                4 - lit.classify(error, 1.0).value()
            );
        }
    }

    #[test]
    fn test_nan_error_and_bad_threshold_land_in_last_band() {
        let s = literal();
        assert_eq!(s.classify(f64::NAN, 1.0), LodLevel::COARSEST);
        assert_eq!(s.classify(0.0, 0.0), LodLevel::COARSEST);
        assert_eq!(s.classify(0.5, -1.0), LodLevel::COARSEST);
    }

    #[test]
    fn test_degenerate_estimate_is_finest_for_both_polarities() {
        let estimate = ErrorEstimate {
            error: 1.0e12,
            distance: crate::MIN_DISTANCE,
            degenerate: true,
        };
        assert_eq!(literal().select(&estimate, 0.05), LodLevel::FINEST);
        assert_eq!(refine().select(&estimate, 0.05), LodLevel::FINEST);
    }

    /// The error is a monotonic function of distance, so the selected level is
    /// monotonic too: with refine polarity, moving the camera closer never
    /// lowers the level; with the default polarity it never raises it.
    #[test]
    fn test_level_monotonic_in_distance() {
        let bounds = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0)).unwrap();
        let threshold = 0.05;
        let distances = [1.0e6, 1.0e5, 2.0e4, 1.0e4, 3.0e3, 1.0e3, 500.0, 100.0, 10.0, 2.0];

        let mut prev_refine = LodLevel::COARSEST;
        let mut prev_literal = LodLevel::FINEST;
        for &d in &distances {
            let camera = CameraState::new(DVec3::new(0.0, 0.0, d), 60.0);
            let estimate = estimate_error(&bounds, 4000, &camera, 1000.0);

            let r = refine().select(&estimate, threshold);
            assert!(r >= prev_refine, "refine level dropped at d={d}: {r} < {prev_refine}");
            prev_refine = r;

            let l = literal().select(&estimate, threshold);
            assert!(l <= prev_literal, "literal level rose at d={d}: {l} > {prev_literal}");
            prev_literal = l;
        }
        assert_eq!(prev_refine, LodLevel::FINEST);
        assert_eq!(prev_literal, LodLevel::COARSEST);
    }

    /// A 2-unit cube with 4000 triangles against threshold 0.05 at 1000 px.
    #[test]
    fn test_reference_cluster_near_and_far() {
        let bounds = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0)).unwrap();
        let near = CameraState::new(DVec3::new(0.0, 0.0, 10.0), 60.0);
        let far = CameraState::new(DVec3::new(0.0, 0.0, 10_000.0), 60.0);
        let near_est = estimate_error(&bounds, 4000, &near, 1000.0);
        let far_est = estimate_error(&bounds, 4000, &far, 1000.0);

        // error ~4.74 near, ~0.0047 far.
        assert!((near_est.error - 4.743).abs() < 0.01);
        assert!((far_est.error - 0.004743).abs() < 1e-5);

        assert_eq!(refine().select(&far_est, 0.05), LodLevel::COARSEST);
        assert_eq!(refine().select(&near_est, 0.05), LodLevel::FINEST);
        assert_eq!(literal().select(&far_est, 0.05), LodLevel::FINEST);
        assert_eq!(literal().select(&near_est, 0.05), LodLevel::COARSEST);
    }

    #[test]
    fn test_custom_bands() {
        let bands = LodBands::custom([0.1, 0.2, 0.4, 0.8]).unwrap();
        let s = LodSelector::new(bands, ErrorPolarity::CoarsenOnError);
        assert_eq!(s.classify(0.05, 1.0).value(), 4);
        assert_eq!(s.classify(0.3, 1.0).value(), 2);
        assert_eq!(s.classify(0.8, 1.0).value(), 0);
    }

    #[test]
    fn test_custom_bands_rejects_bad_factors() {
        assert_eq!(
            LodBands::custom([0.1, 0.05, 0.4, 0.8]),
            Err(LodBandsError::NotIncreasing {
                previous: 0.1,
                next: 0.05
            })
        );
        assert_eq!(
            LodBands::custom([0.0, 0.2, 0.4, 0.8]),
            Err(LodBandsError::NonPositive(0.0))
        );
    }

    #[test]
    fn test_level_bounds_and_display() {
        assert!(LodLevel::new(4).is_some());
        assert!(LodLevel::new(5).is_none());
        assert_eq!(LodLevel::FINEST.mirrored(), LodLevel::COARSEST);
        assert_eq!(LodLevel::new(2).unwrap().to_string(), "LOD2");
    }
}
