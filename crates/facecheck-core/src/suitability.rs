//! Suitability flags derived from a face classification.

use crate::types::{Classification, SizeTier, SuitabilityFlags, Tier};

/// Derive fitness flags from a classification.
pub fn evaluate(c: &Classification) -> SuitabilityFlags {
    SuitabilityFlags {
        biometric_usable: c.size != SizeTier::Small
            && c.sharpness == Tier::High
            && c.noise != Tier::High,
        aesthetically_clean: c.contrast == Tier::High && c.noise == Tier::Low,
        restoration_eligible: !(c.size == SizeTier::Small && c.sharpness == Tier::Low),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];
    const SIZES: [SizeTier; 3] = [SizeTier::Small, SizeTier::Medium, SizeTier::Large];

    fn all_classifications() -> impl Iterator<Item = Classification> {
        SIZES.into_iter().flat_map(|size| {
            TIERS.into_iter().flat_map(move |sharpness| {
                TIERS.into_iter().flat_map(move |noise| {
                    TIERS.into_iter().map(move |contrast| Classification {
                        size,
                        sharpness,
                        noise,
                        contrast,
                    })
                })
            })
        })
    }

    #[test]
    fn test_biometric_requires_size_sharpness_and_clean() {
        let usable: Vec<_> = all_classifications()
            .filter(|c| evaluate(c).biometric_usable)
            .collect();
        // 2 sizes × 1 sharpness × 2 noise × 3 contrast
        assert_eq!(usable.len(), 12);
        for c in usable {
            assert_ne!(c.size, SizeTier::Small);
            assert_eq!(c.sharpness, Tier::High);
            assert_ne!(c.noise, Tier::High);
        }
    }

    #[test]
    fn test_aesthetic_ignores_size_and_sharpness() {
        let c = Classification {
            size: SizeTier::Small,
            sharpness: Tier::Low,
            noise: Tier::Low,
            contrast: Tier::High,
        };
        let flags = evaluate(&c);
        assert!(flags.aesthetically_clean);
        assert!(!flags.biometric_usable);
        assert!(!flags.restoration_eligible);
    }

    #[test]
    fn test_restoration_only_excludes_small_and_blurry() {
        for c in all_classifications() {
            let expected = !(c.size == SizeTier::Small && c.sharpness == Tier::Low);
            assert_eq!(evaluate(&c).restoration_eligible, expected, "{c:?}");
        }
    }

    #[test]
    fn test_medium_noise_still_biometric() {
        let c = Classification {
            size: SizeTier::Medium,
            sharpness: Tier::High,
            noise: Tier::Medium,
            contrast: Tier::Low,
        };
        let flags = evaluate(&c);
        assert!(flags.biometric_usable);
        assert!(!flags.aesthetically_clean);
    }
}
