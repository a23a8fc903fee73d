//! Per-image orchestration: detect → crop → measure → classify → evaluate →
//! (maybe) enhance → composite.
//!
//! Faces are processed one at a time in detector order, and accepted crops
//! are written back into the output image in that same order. When padded
//! boxes of neighbouring faces overlap, the later face wins the shared
//! pixels, which keeps the composite reproducible.

use crate::classify::classify;
use crate::detector::{Detection, DetectorError, FaceDetector};
use crate::enhance::{enhance, EnhancementPlan, Verdict};
use crate::geometry::{BoundingBox, DEFAULT_PADDING_RATIO};
use crate::metrics::measure;
use crate::suitability::evaluate;
use crate::types::{Classification, RawMetrics, SizeTier, SuitabilityFlags};
use image::imageops::FilterType;
use image::RgbImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write image {}: {source}", path.display())]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
}

/// Load an image from disk as 8-bit RGB, dropping any alpha channel.
pub fn load_image(path: &Path) -> Result<RgbImage, PipelineError> {
    let image = image::open(path).map_err(|source| PipelineError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "image loaded"
    );
    Ok(image.to_rgb8())
}

/// Write the composite; the format follows the file extension.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<(), PipelineError> {
    image.save(path).map_err(|source| PipelineError::ImageWrite {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "composite written");
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Contextual padding around each face, as a fraction of its span.
    pub padding_ratio: f32,
    /// Run the guarded enhancement pass on eligible faces.
    pub enhance: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            padding_ratio: DEFAULT_PADDING_RATIO,
            enhance: true,
        }
    }
}

/// What happened to one face after analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FaceAction {
    /// Biometric-usable as is; enhancement not attempted.
    AlreadyUsable,
    /// Too small to restore meaningfully.
    TooSmall,
    /// Enhancement disabled by options.
    NotAttempted,
    /// An enhancement pass ran.
    Enhanced(EnhancementSummary),
}

#[derive(Debug, Clone, Serialize)]
pub struct EnhancementSummary {
    pub plan: EnhancementPlan,
    pub was_modified: bool,
    pub verdict: Verdict,
    pub reason: String,
    pub final_metrics: RawMetrics,
    pub final_classification: Classification,
}

/// Structured per-face report.
#[derive(Debug, Clone, Serialize)]
pub struct FaceReport {
    /// 1-based position in detector order.
    pub index: usize,
    pub confidence: f32,
    pub detected: BoundingBox,
    pub padded: BoundingBox,
    pub metrics: RawMetrics,
    pub classification: Classification,
    pub suitability: SuitabilityFlags,
    pub action: FaceAction,
}

impl FaceReport {
    /// Classification after the pass, or the original one if nothing was
    /// committed.
    pub fn final_classification(&self) -> Classification {
        match &self.action {
            FaceAction::Enhanced(summary) => summary.final_classification,
            _ => self.classification,
        }
    }

    pub fn was_modified(&self) -> bool {
        matches!(&self.action, FaceAction::Enhanced(s) if s.was_modified)
    }
}

/// A detected box that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFace {
    pub index: usize,
    pub detected: BoundingBox,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// The detector found nothing; no composite is produced.
    NoFaces,
    Processed {
        faces: Vec<FaceReport>,
        skipped: Vec<SkippedFace>,
        composite: RgbImage,
    },
}

/// Drives the per-face analysis for one image.
pub struct Pipeline<D: FaceDetector> {
    detector: D,
    options: PipelineOptions,
}

impl<D: FaceDetector> Pipeline<D> {
    pub fn new(detector: D, options: PipelineOptions) -> Self {
        Self { detector, options }
    }

    /// Analyze every face in `image`. The input is never modified; the
    /// composite is a separate buffer.
    pub fn run(&mut self, image: &RgbImage) -> Result<PipelineOutcome, PipelineError> {
        let detections = self.detector.detect(image)?;
        if detections.is_empty() {
            tracing::info!("no faces detected");
            return Ok(PipelineOutcome::NoFaces);
        }
        tracing::info!(faces = detections.len(), "faces detected");

        let (width, height) = image.dimensions();
        let mut composite = image.clone();
        let mut faces = Vec::with_capacity(detections.len());
        let mut skipped = Vec::new();

        for (i, det) in detections.iter().enumerate() {
            let index = i + 1;
            let padded = det.area.padded(self.options.padding_ratio, width, height);
            if padded.is_empty() {
                tracing::warn!(
                    index,
                    bbox = ?det.area,
                    "face box is empty after clamping; skipping"
                );
                skipped.push(SkippedFace {
                    index,
                    detected: det.area,
                    reason: "box lies outside the image".to_string(),
                });
                continue;
            }

            tracing::debug!(
                index,
                bbox = ?det.area,
                ?padded,
                area = padded.area(),
                "cropping face"
            );
            let crop = crop_region(image, &padded);
            let (report, accepted) = self.process_face(index, det, padded, &crop, (width, height));

            if let Some(accepted) = accepted {
                paste_region(&mut composite, &accepted, &padded);
            }
            faces.push(report);
        }

        Ok(PipelineOutcome::Processed { faces, skipped, composite })
    }

    /// Analyze one crop; returns the report and the crop to composite, if
    /// an enhancement was committed.
    fn process_face(
        &self,
        index: usize,
        det: &Detection,
        padded: BoundingBox,
        crop: &RgbImage,
        full_dims: (u32, u32),
    ) -> (FaceReport, Option<RgbImage>) {
        let metrics = measure(crop, Some(full_dims));
        let classification = classify(&metrics);
        let suitability = evaluate(&classification);

        let mut accepted = None;
        let action = if !should_enhance(&classification, &suitability) {
            if suitability.biometric_usable {
                FaceAction::AlreadyUsable
            } else {
                FaceAction::TooSmall
            }
        } else if !self.options.enhance {
            FaceAction::NotAttempted
        } else {
            let outcome = enhance(crop, &metrics, &classification, Some(full_dims));
            let summary = EnhancementSummary {
                plan: outcome.plan,
                was_modified: outcome.was_modified,
                verdict: outcome.verdict,
                reason: outcome.reason,
                final_metrics: outcome.metrics,
                final_classification: outcome.classification,
            };
            if outcome.was_modified {
                accepted = Some(outcome.crop);
            }
            FaceAction::Enhanced(summary)
        };

        tracing::info!(
            index,
            size = %classification.size,
            sharpness = %classification.sharpness,
            noise = %classification.noise,
            contrast = %classification.contrast,
            biometric_usable = suitability.biometric_usable,
            modified = accepted.is_some(),
            "face analyzed"
        );

        let report = FaceReport {
            index,
            confidence: det.confidence,
            detected: det.area,
            padded,
            metrics,
            classification,
            suitability,
            action,
        };
        (report, accepted)
    }
}

/// Faces that are already biometric-usable, or too small to restore, are
/// left as they are.
pub fn should_enhance(classification: &Classification, flags: &SuitabilityFlags) -> bool {
    !flags.biometric_usable && classification.size != SizeTier::Small
}

/// Owned copy of a clamped, non-empty region.
pub fn crop_region(image: &RgbImage, region: &BoundingBox) -> RgbImage {
    image::imageops::crop_imm(
        image,
        region.x_min as u32,
        region.y_min as u32,
        region.width(),
        region.height(),
    )
    .to_image()
}

/// Resize `patch` to exactly the region's span and write it in place.
pub fn paste_region(target: &mut RgbImage, patch: &RgbImage, region: &BoundingBox) {
    let (w, h) = (region.width(), region.height());
    if w == 0 || h == 0 {
        return;
    }
    if patch.dimensions() == (w, h) {
        image::imageops::replace(target, patch, region.x_min as i64, region.y_min as i64);
    } else {
        let fitted = image::imageops::resize(patch, w, h, FilterType::Lanczos3);
        image::imageops::replace(target, &fitted, region.x_min as i64, region.y_min as i64);
    }
}
