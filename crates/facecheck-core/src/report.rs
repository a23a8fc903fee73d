//! Human-readable rendering of per-face reports.

use crate::pipeline::{FaceAction, FaceReport, SkippedFace};
use std::fmt;

const RULE: &str = "------------------------------";

impl fmt::Display for FaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.classification;
        let m = &self.metrics;
        let s = &self.suitability;

        writeln!(f, "=== FACE {} (confidence {:.2}) ===", self.index, self.confidence)?;
        writeln!(
            f,
            "Status: {}",
            if s.biometric_usable { "FIT for biometric use" } else { "NOT FIT for biometric use" }
        )?;
        writeln!(
            f,
            "  > Size:      {} ({:.2}% of image, {} px)",
            c.size, m.area_fraction, m.area_px
        )?;
        writeln!(f, "  > Sharpness: {} ({:.2})", c.sharpness, m.sharpness)?;
        writeln!(f, "  > Noise:     {} ({:.2})", c.noise, m.noise)?;
        writeln!(f, "  > Contrast:  {} ({:.2})", c.contrast, m.contrast)?;
        writeln!(
            f,
            "  > Aesthetic: {}   Restorable: {}",
            if s.aesthetically_clean { "clean" } else { "not clean" },
            if s.restoration_eligible { "yes" } else { "no" }
        )?;

        match &self.action {
            FaceAction::AlreadyUsable => writeln!(f, "  > Enhancement: not needed")?,
            FaceAction::TooSmall => writeln!(f, "  > Enhancement: skipped, face too small")?,
            FaceAction::NotAttempted => writeln!(f, "  > Enhancement: disabled")?,
            FaceAction::Enhanced(summary) => {
                writeln!(f, "  > Enhancement: {}", summary.plan)?;
                if summary.was_modified {
                    let fc = self.final_classification();
                    writeln!(f, "    committed ({})", summary.reason)?;
                    writeln!(
                        f,
                        "    now: sharpness {}, noise {}, contrast {}",
                        fc.sharpness, fc.noise, fc.contrast
                    )?;
                } else {
                    writeln!(f, "    rolled back ({})", summary.reason)?;
                }
            }
        }
        write!(f, "{RULE}")
    }
}

impl fmt::Display for SkippedFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "=== FACE {} skipped: {} ({:?}) ===", self.index, self.reason, self.detected)
    }
}

/// One-line tally for the end of a run.
pub fn summary_line(faces: &[FaceReport], skipped: &[SkippedFace]) -> String {
    let fit = faces.iter().filter(|r| r.suitability.biometric_usable).count();
    let enhanced = faces.iter().filter(|r| r.was_modified()).count();
    let mut line = format!(
        "{} face(s) analyzed: {fit} fit as-is, {enhanced} enhanced",
        faces.len()
    );
    if !skipped.is_empty() {
        line.push_str(&format!(", {} skipped", skipped.len()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::{EnhancementPlan, SharpenStrength, Verdict};
    use crate::geometry::BoundingBox;
    use crate::pipeline::EnhancementSummary;
    use crate::types::{Classification, RawMetrics, SizeTier, SuitabilityFlags, Tier};

    fn report(action: FaceAction) -> FaceReport {
        FaceReport {
            index: 1,
            confidence: 0.97,
            detected: BoundingBox::new(10, 10, 60, 60),
            padded: BoundingBox::new(5, 5, 65, 65),
            metrics: RawMetrics {
                sharpness: 90.0,
                noise: 2.0,
                contrast: 20.0,
                area_fraction: 10.0,
                area_px: 3600,
            },
            classification: Classification {
                size: SizeTier::Medium,
                sharpness: Tier::Low,
                noise: Tier::Low,
                contrast: Tier::Low,
            },
            suitability: SuitabilityFlags {
                biometric_usable: false,
                aesthetically_clean: false,
                restoration_eligible: true,
            },
            action,
        }
    }

    fn summary(was_modified: bool, verdict: Verdict, reason: &str) -> EnhancementSummary {
        EnhancementSummary {
            plan: EnhancementPlan {
                denoise: false,
                sharpen: Some(SharpenStrength::Strong),
                contrast: true,
            },
            was_modified,
            verdict,
            reason: reason.to_string(),
            final_metrics: RawMetrics {
                sharpness: 140.0,
                noise: 2.0,
                contrast: 35.0,
                area_fraction: 10.0,
                area_px: 3600,
            },
            final_classification: Classification {
                size: SizeTier::Medium,
                sharpness: Tier::Medium,
                noise: Tier::Low,
                contrast: Tier::Medium,
            },
        }
    }

    #[test]
    fn test_rollback_report_names_reason() {
        let rolled_back = summary(false, Verdict::InsignificantChange, "insignificant change");
        let text = report(FaceAction::Enhanced(rolled_back)).to_string();
        assert!(text.contains("NOT FIT"));
        assert!(text.contains("sharpen(strong) → contrast"));
        assert!(text.contains("rolled back (insignificant change)"));
        assert!(text.contains("Size:      MEDIUM (10.00% of image, 3600 px)"));
    }

    #[test]
    fn test_committed_report_shows_new_tiers() {
        let committed = summary(true, Verdict::Accepted, "accepted");
        let text = report(FaceAction::Enhanced(committed)).to_string();
        assert!(text.contains("committed (accepted)"));
        assert!(text.contains("now: sharpness MEDIUM, noise LOW, contrast MEDIUM"));
    }

    #[test]
    fn test_summary_line_counts() {
        let faces = vec![
            report(FaceAction::Enhanced(summary(true, Verdict::Accepted, "accepted"))),
            report(FaceAction::TooSmall),
        ];
        let skipped = vec![SkippedFace {
            index: 3,
            detected: BoundingBox::new(0, 0, 0, 0),
            reason: "box lies outside the image".into(),
        }];
        assert_eq!(
            summary_line(&faces, &skipped),
            "2 face(s) analyzed: 0 fit as-is, 1 enhanced, 1 skipped"
        );
    }

    #[test]
    fn test_report_serializes_action_tag() {
        let json = serde_json::to_value(report(FaceAction::TooSmall)).unwrap();
        assert_eq!(json["action"]["status"], "too_small");
        assert_eq!(json["classification"]["sharpness"], "LOW");
    }
}
