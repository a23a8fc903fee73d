//! Fixed-threshold tiering of raw metrics.
//!
//! The thresholds are empirical and part of the output contract: moving a
//! boundary or swapping `<` for `<=` silently reclassifies borderline faces.
//! Every band is inclusive on its MEDIUM side.

use crate::types::{Classification, RawMetrics, SizeTier, Tier};

/// Area percentage strictly above which a face is LARGE.
pub const SIZE_LARGE_ABOVE: f64 = 15.0;
/// Area percentage at or above which a face is at least MEDIUM.
pub const SIZE_MEDIUM_FROM: f64 = 7.0;

/// Laplacian variance strictly above which sharpness is HIGH.
pub const SHARPNESS_HIGH_ABOVE: f64 = 300.0;
/// Laplacian variance at or above which sharpness is at least MEDIUM.
pub const SHARPNESS_MEDIUM_FROM: f64 = 120.0;

/// Median residual strictly below which noise is LOW.
pub const NOISE_LOW_BELOW: f64 = 3.0;
/// Median residual at or below which noise is at most MEDIUM.
pub const NOISE_MEDIUM_UPTO: f64 = 6.0;

/// Intensity standard deviation strictly above which contrast is HIGH.
pub const CONTRAST_HIGH_ABOVE: f64 = 50.0;
/// Intensity standard deviation at or above which contrast is at least MEDIUM.
pub const CONTRAST_MEDIUM_FROM: f64 = 30.0;

pub fn classify(metrics: &RawMetrics) -> Classification {
    Classification {
        size: size_tier(metrics.area_fraction),
        sharpness: sharpness_tier(metrics.sharpness),
        noise: noise_tier(metrics.noise),
        contrast: contrast_tier(metrics.contrast),
    }
}

pub fn size_tier(area_fraction: f64) -> SizeTier {
    if area_fraction > SIZE_LARGE_ABOVE {
        SizeTier::Large
    } else if area_fraction >= SIZE_MEDIUM_FROM {
        SizeTier::Medium
    } else {
        SizeTier::Small
    }
}

pub fn sharpness_tier(sharpness: f64) -> Tier {
    if sharpness > SHARPNESS_HIGH_ABOVE {
        Tier::High
    } else if sharpness >= SHARPNESS_MEDIUM_FROM {
        Tier::Medium
    } else {
        Tier::Low
    }
}

/// Noise tiers read as "how noisy": `High` is the bad end.
pub fn noise_tier(noise: f64) -> Tier {
    if noise < NOISE_LOW_BELOW {
        Tier::Low
    } else if noise <= NOISE_MEDIUM_UPTO {
        Tier::Medium
    } else {
        Tier::High
    }
}

pub fn contrast_tier(contrast: f64) -> Tier {
    if contrast > CONTRAST_HIGH_ABOVE {
        Tier::High
    } else if contrast >= CONTRAST_MEDIUM_FROM {
        Tier::Medium
    } else {
        Tier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(area_fraction: f64, sharpness: f64, noise: f64, contrast: f64) -> RawMetrics {
        RawMetrics { sharpness, noise, contrast, area_fraction, area_px: 0 }
    }

    #[test]
    fn test_sharpness_boundaries() {
        assert_eq!(sharpness_tier(300.0), Tier::Medium);
        assert_eq!(sharpness_tier(300.01), Tier::High);
        assert_eq!(sharpness_tier(120.0), Tier::Medium);
        assert_eq!(sharpness_tier(119.99), Tier::Low);
        assert_eq!(sharpness_tier(0.0), Tier::Low);
    }

    #[test]
    fn test_noise_boundaries() {
        assert_eq!(noise_tier(2.99), Tier::Low);
        assert_eq!(noise_tier(3.0), Tier::Medium);
        assert_eq!(noise_tier(6.0), Tier::Medium);
        assert_eq!(noise_tier(6.01), Tier::High);
        assert_eq!(noise_tier(0.0), Tier::Low);
    }

    #[test]
    fn test_size_boundaries() {
        assert_eq!(size_tier(15.0), SizeTier::Medium);
        assert_eq!(size_tier(15.01), SizeTier::Large);
        assert_eq!(size_tier(7.0), SizeTier::Medium);
        assert_eq!(size_tier(6.99), SizeTier::Small);
        assert_eq!(size_tier(0.0), SizeTier::Small);
    }

    #[test]
    fn test_contrast_boundaries() {
        assert_eq!(contrast_tier(50.0), Tier::Medium);
        assert_eq!(contrast_tier(50.5), Tier::High);
        assert_eq!(contrast_tier(30.0), Tier::Medium);
        assert_eq!(contrast_tier(29.9), Tier::Low);
    }

    #[test]
    fn test_classify_is_pure() {
        let m = metrics(12.0, 250.0, 4.5, 41.0);
        assert_eq!(classify(&m), classify(&m));
    }

    #[test]
    fn test_classify_sharp_large_clean_face() {
        let c = classify(&metrics(20.0, 400.0, 1.0, 60.0));
        assert_eq!(
            c,
            Classification {
                size: SizeTier::Large,
                sharpness: Tier::High,
                noise: Tier::Low,
                contrast: Tier::High,
            }
        );
    }

    #[test]
    fn test_classify_soft_medium_face() {
        let c = classify(&metrics(10.0, 90.0, 2.0, 20.0));
        assert_eq!(c.size, SizeTier::Medium);
        assert_eq!(c.sharpness, Tier::Low);
        assert_eq!(c.noise, Tier::Low);
        assert_eq!(c.contrast, Tier::Low);
    }
}
