//! Guarded single-pass enhancement.
//!
//! A pass picks corrective filters from the crop's original classification,
//! runs them on a private copy, re-measures the copy and only commits it if
//! sharpness and noise both hold (no regression) and at least one of them
//! improves by a meaningful margin. Anything else rolls back to the
//! untouched input. Contrast decides whether correction is attempted but
//! never takes part in the accept/reject gate.

use crate::classify::classify;
use crate::filters;
use crate::metrics::measure;
use crate::types::{Classification, RawMetrics, Tier};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reject when new noise exceeds old noise by more than this factor.
pub const REGRESSION_NOISE_RATIO: f64 = 1.05;
/// Reject when new sharpness falls below this fraction of old sharpness.
pub const REGRESSION_SHARPNESS_RATIO: f64 = 0.95;
/// Accept when sharpness grows beyond this factor...
pub const GAIN_SHARPNESS_RATIO: f64 = 1.10;
/// ...or when noise drops below this fraction.
pub const GAIN_NOISE_RATIO: f64 = 0.90;

/// Unsharp-mask strength, chosen from the sharpness tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharpenStrength {
    Mild,
    Strong,
}

impl SharpenStrength {
    /// `(sigma, amount)` for the unsharp mask.
    fn params(self) -> (f32, f32) {
        match self {
            SharpenStrength::Mild => (1.0, 0.6),
            SharpenStrength::Strong => (1.0, 1.4),
        }
    }
}

/// Which corrections a pass will run, in fixed order:
/// denoise → sharpen → contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnhancementPlan {
    pub denoise: bool,
    pub sharpen: Option<SharpenStrength>,
    pub contrast: bool,
}

impl EnhancementPlan {
    /// Gate each correction independently on the original classification.
    pub fn for_classification(c: &Classification) -> Self {
        Self {
            denoise: c.noise == Tier::High,
            sharpen: match c.sharpness {
                Tier::Low => Some(SharpenStrength::Strong),
                Tier::Medium => Some(SharpenStrength::Mild),
                Tier::High => None,
            },
            contrast: c.contrast != Tier::High,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.denoise && self.sharpen.is_none() && !self.contrast
    }

    /// Run the planned filters on a copy of `crop`.
    pub fn apply(&self, crop: &RgbImage) -> RgbImage {
        let mut working = crop.clone();
        if self.denoise {
            working = filters::denoise(&working);
        }
        if let Some(strength) = self.sharpen {
            let (sigma, amount) = strength.params();
            working = filters::unsharp_mask(&working, sigma, amount);
        }
        if self.contrast {
            working = filters::local_contrast(&working);
        }
        working
    }
}

impl fmt::Display for EnhancementPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut steps = Vec::new();
        if self.denoise {
            steps.push("denoise".to_string());
        }
        match self.sharpen {
            Some(SharpenStrength::Strong) => steps.push("sharpen(strong)".to_string()),
            Some(SharpenStrength::Mild) => steps.push("sharpen(mild)".to_string()),
            None => {}
        }
        if self.contrast {
            steps.push("contrast".to_string());
        }
        if steps.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&steps.join(" → "))
        }
    }
}

/// Which branch of the gate decided a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    RegressionDetected,
    InsignificantChange,
    NothingToApply,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Accepted => "accepted",
            Verdict::RegressionDetected => "regression detected",
            Verdict::InsignificantChange => "insignificant change",
            Verdict::NothingToApply => "no applicable correction",
        })
    }
}

/// Non-regression first, then minimum gain.
pub fn validate(before: &RawMetrics, after: &RawMetrics) -> Verdict {
    let noise_regressed = after.noise > before.noise * REGRESSION_NOISE_RATIO;
    let sharpness_regressed = after.sharpness < before.sharpness * REGRESSION_SHARPNESS_RATIO;
    if noise_regressed || sharpness_regressed {
        return Verdict::RegressionDetected;
    }

    let sharper = after.sharpness > before.sharpness * GAIN_SHARPNESS_RATIO;
    let cleaner = after.noise < before.noise * GAIN_NOISE_RATIO;
    if sharper || cleaner {
        Verdict::Accepted
    } else {
        Verdict::InsignificantChange
    }
}

/// Result of one enhancement pass.
///
/// When `was_modified` is false, `crop` is a byte-identical copy of the
/// input and `classification`/`metrics` are the input's own.
#[derive(Debug, Clone)]
pub struct EnhancementOutcome {
    pub crop: RgbImage,
    pub classification: Classification,
    pub metrics: RawMetrics,
    pub was_modified: bool,
    pub verdict: Verdict,
    pub reason: String,
    pub plan: EnhancementPlan,
}

/// Run one guarded pass over `crop`.
///
/// `metrics` and `classification` must describe `crop` as given;
/// `full_dims` is forwarded to the re-measurement so the size tier of the
/// candidate is computed on the same basis.
pub fn enhance(
    crop: &RgbImage,
    metrics: &RawMetrics,
    classification: &Classification,
    full_dims: Option<(u32, u32)>,
) -> EnhancementOutcome {
    let plan = EnhancementPlan::for_classification(classification);
    run_pass(crop, metrics, classification, full_dims, plan, |c| plan.apply(c))
}

fn run_pass(
    crop: &RgbImage,
    before: &RawMetrics,
    classification: &Classification,
    full_dims: Option<(u32, u32)>,
    plan: EnhancementPlan,
    apply: impl FnOnce(&RgbImage) -> RgbImage,
) -> EnhancementOutcome {
    let rollback = |verdict: Verdict, reason: String| EnhancementOutcome {
        crop: crop.clone(),
        classification: *classification,
        metrics: *before,
        was_modified: false,
        verdict,
        reason,
        plan,
    };

    if plan.is_empty() {
        return rollback(Verdict::NothingToApply, Verdict::NothingToApply.to_string());
    }

    let working = apply(crop);
    let after = measure(&working, full_dims);
    let verdict = validate(before, &after);
    let reason = format!(
        "{verdict}: sharpness {:.2} → {:.2}, noise {:.2} → {:.2}",
        before.sharpness, after.sharpness, before.noise, after.noise
    );

    tracing::debug!(
        %plan,
        %verdict,
        sharpness_before = before.sharpness,
        sharpness_after = after.sharpness,
        noise_before = before.noise,
        noise_after = after.noise,
        "enhancement pass validated"
    );

    if !verdict.is_accepted() {
        return rollback(verdict, reason);
    }

    EnhancementOutcome {
        classification: classify(&after),
        crop: working,
        metrics: after,
        was_modified: true,
        verdict,
        reason,
        plan,
    }
}
