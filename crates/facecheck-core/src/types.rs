//! Plain data shared across the metric, tiering and report stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw quality measurements for one face crop.
///
/// Recomputed from scratch whenever a crop's pixels change, so the original
/// crop and an enhanced candidate each own a separate instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    /// Variance of the Laplacian response. Higher = sharper.
    pub sharpness: f64,
    /// Median absolute residual against a 3×3 median filter.
    pub noise: f64,
    /// Standard deviation of intensity.
    pub contrast: f64,
    /// Crop area as a percentage of the full image, in [0, 100].
    /// Zero when the full-image dimensions are unknown.
    pub area_fraction: f64,
    /// Crop area in pixels.
    pub area_px: u64,
}

/// Three-level ordinal tier used for sharpness, noise and contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Low => "LOW",
            Tier::Medium => "MEDIUM",
            Tier::High => "HIGH",
        })
    }
}

/// Three-level ordinal tier for relative face size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SizeTier::Small => "SMALL",
            SizeTier::Medium => "MEDIUM",
            SizeTier::Large => "LARGE",
        })
    }
}

/// Tiered view of a [`RawMetrics`]. Always recomputed, never edited.
///
/// Note that a `High` noise tier means a noisy crop (bad), while `High`
/// sharpness and contrast are good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    pub size: SizeTier,
    pub sharpness: Tier,
    pub noise: Tier,
    pub contrast: Tier,
}

/// Boolean fitness flags derived from a [`Classification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitabilityFlags {
    /// Large, sharp and clean enough for identity verification.
    pub biometric_usable: bool,
    /// High contrast with low noise.
    pub aesthetically_clean: bool,
    /// Worth attempting restoration at all.
    pub restoration_eligible: bool,
}
