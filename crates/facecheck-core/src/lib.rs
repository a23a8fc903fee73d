//! facecheck-core — Face quality analysis and guarded enhancement.
//!
//! Detects faces with SCRFD (ONNX Runtime, CPU), measures each padded crop
//! for sharpness, noise, contrast and relative size, classifies the values
//! into tiers and derives suitability flags. Eligible faces get a single
//! enhancement pass that is only committed when it measurably helps.

pub mod classify;
pub mod detector;
pub mod enhance;
pub mod filters;
pub mod geometry;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod suitability;
pub mod types;

pub use detector::{Detection, DetectorError, FaceDetector, ScrfdDetector};
pub use enhance::{EnhancementOutcome, EnhancementPlan, SharpenStrength, Verdict};
pub use geometry::{BoundingBox, DEFAULT_PADDING_RATIO};
pub use pipeline::{
    load_image, save_image, FaceAction, FaceReport, Pipeline, PipelineError, PipelineOptions,
    PipelineOutcome, SkippedFace,
};
pub use types::{Classification, RawMetrics, SizeTier, SuitabilityFlags, Tier};
