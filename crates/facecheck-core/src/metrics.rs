//! Quality metrics for a single face crop.
//!
//! All metrics are computed on the single-channel intensity image. Every
//! function here is pure and runs in time linear in the pixel count.

use crate::types::RawMetrics;
use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::median_filter;

/// Radius of the median filter used for the noise residual (3×3 window).
const NOISE_MEDIAN_RADIUS: u32 = 1;

/// Measure a crop. `full_dims` are the `(width, height)` of the image the
/// crop was taken from; without them the area fraction is zero.
pub fn measure(crop: &RgbImage, full_dims: Option<(u32, u32)>) -> RawMetrics {
    let gray = to_intensity(crop);
    let (w, h) = gray.dimensions();
    let area_px = w as u64 * h as u64;

    let metrics = RawMetrics {
        sharpness: laplacian_variance(&gray),
        noise: median_residual_noise(&gray),
        contrast: intensity_stddev(&gray),
        area_fraction: area_fraction(area_px, full_dims),
        area_px,
    };

    tracing::debug!(
        width = w,
        height = h,
        sharpness = metrics.sharpness,
        noise = metrics.noise,
        contrast = metrics.contrast,
        area_fraction = metrics.area_fraction,
        "measured crop"
    );

    metrics
}

/// BT.601 intensity in 14-bit fixed point, rounded to nearest.
///
/// The tier thresholds are calibrated on these weights
/// (0.299 R, 0.587 G, 0.114 B), not on the Rec.709 weights of
/// `imageops::grayscale`.
pub fn to_intensity(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let v = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14;
        Luma([v as u8])
    })
}

/// Percentage of the full image covered by `area_px`.
pub fn area_fraction(area_px: u64, full_dims: Option<(u32, u32)>) -> f64 {
    match full_dims {
        Some((w, h)) if w > 0 && h > 0 => {
            let full = w as f64 * h as f64;
            (area_px as f64 / full * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

/// Variance of the 4-neighbour Laplacian response.
///
/// Kernel `[0 1 0; 1 -4 1; 0 1 0]` with reflect-101 borders.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return 0.0;
    }

    let px = |x: i64, y: i64| -> f64 {
        gray.get_pixel(reflect101(x, w), reflect101(y, h))[0] as f64
    };

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let v = px(x - 1, y) + px(x + 1, y) + px(x, y - 1) + px(x, y + 1) - 4.0 * px(x, y);
            sum += v;
            sum_sq += v * v;
        }
    }

    population_variance(sum, sum_sq, w as u64 * h as u64)
}

/// Median of `|gray - median3x3(gray)|`.
///
/// Real edges survive a median filter, so they leave little residual; the
/// median (not the mean) keeps isolated highlights from dominating.
pub fn median_residual_noise(gray: &GrayImage) -> f64 {
    let n = gray.len() as u64;
    if n == 0 {
        return 0.0;
    }

    let smoothed = median_filter(gray, NOISE_MEDIAN_RADIUS, NOISE_MEDIAN_RADIUS);

    let mut hist = [0u64; 256];
    for (orig, med) in gray.pixels().zip(smoothed.pixels()) {
        hist[orig[0].abs_diff(med[0]) as usize] += 1;
    }

    histogram_median(&hist, n)
}

/// Standard deviation of intensity over the whole crop.
pub fn intensity_stddev(gray: &GrayImage) -> f64 {
    let n = gray.len() as u64;
    if n == 0 {
        return 0.0;
    }
    let (sum, sum_sq) = gray.pixels().fold((0.0f64, 0.0f64), |(s, sq), p| {
        let v = p[0] as f64;
        (s + v, sq + v * v)
    });
    population_variance(sum, sum_sq, n).sqrt()
}

fn population_variance(sum: f64, sum_sq: f64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Median of a 256-bin histogram holding `n` samples; averages the two
/// middle samples when `n` is even.
fn histogram_median(hist: &[u64; 256], n: u64) -> f64 {
    let nth = |k: u64| -> usize {
        let mut acc = 0u64;
        for (value, &count) in hist.iter().enumerate() {
            acc += count;
            if acc > k {
                return value;
            }
        }
        255
    };
    let lo = nth((n - 1) / 2);
    let hi = nth(n / 2);
    (lo + hi) as f64 / 2.0
}

/// Reflect-101 border: `-1 → 1`, `len → len - 2`.
fn reflect101(i: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= len {
        i = 2 * (len - 1) - i;
    }
    i.clamp(0, len - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn gray_fn(w: u32, h: u32, mut f: impl FnMut(u32, u32) -> u8) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([f(x, y)]))
    }

    #[test]
    fn test_flat_crop_scores_zero() {
        let crop = RgbImage::from_pixel(40, 30, Rgb([128, 128, 128]));
        let m = measure(&crop, Some((400, 300)));
        assert_eq!(m.sharpness, 0.0);
        assert_eq!(m.noise, 0.0);
        assert_eq!(m.contrast, 0.0);
        assert_eq!(m.area_px, 1200);
        assert!((m.area_fraction - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_area_fraction_without_dimensions_is_zero() {
        assert_eq!(area_fraction(2500, None), 0.0);
        assert_eq!(area_fraction(2500, Some((0, 100))), 0.0);
        assert!((area_fraction(2500, Some((100, 100))) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_checkerboard_is_sharp_and_contrasty() {
        let gray = gray_fn(32, 32, |x, y| if (x + y) % 2 == 0 { 0 } else { 255 });
        assert!(laplacian_variance(&gray) > 10_000.0);
        assert!((intensity_stddev(&gray) - 127.5).abs() < 1e-9);
    }

    #[test]
    fn test_blur_lowers_sharpness() {
        let gray = gray_fn(48, 48, |x, y| if (x / 3 + y / 3) % 2 == 0 { 30 } else { 220 });
        let blurred = image::imageops::blur(&gray, 2.0);
        assert!(laplacian_variance(&blurred) < laplacian_variance(&gray));
    }

    #[test]
    fn test_step_edge_is_not_noise() {
        let gray = gray_fn(40, 40, |x, _| if x < 20 { 0 } else { 255 });
        assert_eq!(median_residual_noise(&gray), 0.0);
        assert!(intensity_stddev(&gray) > 100.0);
    }

    #[test]
    fn test_sparse_highlights_do_not_move_noise() {
        // One bright pixel in every 5x5 block: far fewer than half the pixels.
        let gray = gray_fn(50, 50, |x, y| if x % 5 == 2 && y % 5 == 2 { 255 } else { 100 });
        assert_eq!(median_residual_noise(&gray), 0.0);
    }

    #[test]
    fn test_dense_noise_is_measured() {
        // Deterministic LCG speckle around mid-grey.
        let mut state = 12345u32;
        let gray = gray_fn(64, 64, |_, _| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let jitter = ((state >> 16) % 41) as i32 - 20;
            (128 + jitter) as u8
        });
        assert!(median_residual_noise(&gray) >= 3.0);
    }

    #[test]
    fn test_intensity_uses_bt601_weights() {
        let px = |r, g, b| to_intensity(&RgbImage::from_pixel(1, 1, Rgb([r, g, b])))[(0, 0)][0];
        assert_eq!(px(255, 0, 0), 76);
        assert_eq!(px(0, 255, 0), 150);
        assert_eq!(px(0, 0, 255), 29);
        assert_eq!(px(255, 255, 255), 255);
        assert_eq!(px(0, 0, 0), 0);
    }

    #[test]
    fn test_red_black_checkerboard_has_medium_contrast() {
        let crop = RgbImage::from_fn(40, 40, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 0, 0])
            }
        });
        let m = measure(&crop, None);
        assert!((m.contrast - 38.0).abs() < 1e-9, "contrast={}", m.contrast);
        assert_eq!(crate::classify::contrast_tier(m.contrast), crate::types::Tier::Medium);
    }

    #[test]
    fn test_histogram_median_even_count_averages() {
        let mut hist = [0u64; 256];
        hist[2] = 2;
        hist[5] = 2;
        assert_eq!(histogram_median(&hist, 4), 3.5);
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-1, 1), 0);
        assert_eq!(reflect101(1, 1), 0);
    }

    #[test]
    fn test_measure_is_deterministic_and_pure() {
        let crop = RgbImage::from_fn(20, 20, |x, y| Rgb([(x * 12) as u8, (y * 12) as u8, 90]));
        let before = crop.clone();
        let a = measure(&crop, Some((100, 100)));
        let b = measure(&crop, Some((100, 100)));
        assert_eq!(a, b);
        assert_eq!(crop, before);
    }
}
