//! Pixel filters used by the enhancement pass: denoise, unsharp mask and
//! local contrast (CLAHE). All filters return a new buffer and degrade to a
//! plain copy on crops too small to process.

use crate::metrics::to_intensity;
use image::{GrayImage, RgbImage};
use imageproc::filter::median_filter;

const DENOISE_RADIUS: u32 = 1;

/// Grid size for CLAHE tiles along each axis.
pub const CLAHE_TILES: u32 = 4;
/// Histogram clip limit as a fraction of tile pixels.
pub const CLAHE_CLIP_LIMIT: f32 = 0.01;

/// Per-channel 3×3 median filter.
pub fn denoise(crop: &RgbImage) -> RgbImage {
    if crop.width() < 3 || crop.height() < 3 {
        return crop.clone();
    }
    median_filter(crop, DENOISE_RADIUS, DENOISE_RADIUS)
}

/// Unsharp mask: `out = src + amount · (src − blur(src, sigma))`.
pub fn unsharp_mask(crop: &RgbImage, sigma: f32, amount: f32) -> RgbImage {
    if amount.abs() < f32::EPSILON || sigma <= 0.0 || crop.width() < 2 || crop.height() < 2 {
        return crop.clone();
    }

    let blurred = image::imageops::blur(crop, sigma);
    let mut out = crop.clone();
    for (dst, (src, blur)) in out.pixels_mut().zip(crop.pixels().zip(blurred.pixels())) {
        for c in 0..3 {
            let s = src[c] as f32;
            let v = s + amount * (s - blur[c] as f32);
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Local contrast correction on the intensity channel.
///
/// Equalizes BT.601 intensity with [`clahe_enhance`] and shifts each RGB
/// channel by the per-pixel intensity change, so hue is left mostly untouched.
pub fn local_contrast(crop: &RgbImage) -> RgbImage {
    let luma = to_intensity(crop);
    let mut equalized = luma.clone();
    if !clahe_enhance(&mut equalized, CLAHE_TILES, CLAHE_CLIP_LIMIT) {
        return crop.clone();
    }

    let mut out = crop.clone();
    for (px, (before, after)) in out.pixels_mut().zip(luma.pixels().zip(equalized.pixels())) {
        let delta = after[0] as i16 - before[0] as i16;
        for c in 0..3 {
            px[c] = (px[c] as i16 + delta).clamp(0, 255) as u8;
        }
    }
    out
}

/// Contrast-Limited Adaptive Histogram Equalization, in place.
///
/// Builds a clipped-histogram CDF per tile of a `tiles × tiles` grid, then
/// maps each pixel by bilinear interpolation between the four nearest tile
/// CDFs. Returns `false` (and leaves `gray` untouched) when the image is
/// smaller than one pixel per tile.
pub fn clahe_enhance(gray: &mut GrayImage, tiles: u32, clip_limit: f32) -> bool {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    let t = tiles.max(1) as usize;
    if w == 0 || h == 0 {
        return false;
    }

    let tile_w = w / t;
    let tile_h = h / t;
    if tile_w == 0 || tile_h == 0 {
        return false;
    }
    let tile_pixels = tile_w * tile_h;
    let data: &mut [u8] = gray;

    let mut cdfs: Vec<[f32; 256]> = Vec::with_capacity(t * t);
    for row in 0..t {
        for col in 0..t {
            let mut hist = [0u32; 256];
            let (y0, x0) = (row * tile_h, col * tile_w);
            for y in y0..y0 + tile_h {
                for &p in &data[y * w + x0..y * w + x0 + tile_w] {
                    hist[p as usize] += 1;
                }
            }

            let clip = ((clip_limit * tile_pixels as f32) as u32).max(1);
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let redist = excess / 256;
            let leftover = (excess % 256) as usize;
            for (i, bin) in hist.iter_mut().enumerate() {
                *bin += redist;
                if i < leftover {
                    *bin += 1;
                }
            }

            let mut cdf = [0f32; 256];
            cdf[0] = hist[0] as f32;
            for i in 1..256 {
                cdf[i] = cdf[i - 1] + hist[i] as f32;
            }
            let cdf_min = cdf.iter().find(|&&v| v > 0.0).copied().unwrap_or(0.0);
            let denom = tile_pixels as f32 - cdf_min;
            if denom > 0.0 {
                for v in cdf.iter_mut() {
                    *v = ((*v - cdf_min) / denom * 255.0).clamp(0.0, 255.0);
                }
            } else {
                // Single-valued tile: identity mapping.
                for (i, v) in cdf.iter_mut().enumerate() {
                    *v = i as f32;
                }
            }
            cdfs.push(cdf);
        }
    }

    for y in 0..h {
        let fy = (y as f32 / tile_h as f32 - 0.5).clamp(0.0, (t - 1) as f32);
        let r0 = fy as usize;
        let r1 = (r0 + 1).min(t - 1);
        let dy = fy - r0 as f32;

        for x in 0..w {
            let fx = (x as f32 / tile_w as f32 - 0.5).clamp(0.0, (t - 1) as f32);
            let c0 = fx as usize;
            let c1 = (c0 + 1).min(t - 1);
            let dx = fx - c0 as f32;

            let pixel = data[y * w + x] as usize;
            let top = cdfs[r0 * t + c0][pixel] * (1.0 - dx) + cdfs[r0 * t + c1][pixel] * dx;
            let bot = cdfs[r1 * t + c0][pixel] * (1.0 - dx) + cdfs[r1 * t + c1][pixel] * dx;
            data[y * w + x] = (top * (1.0 - dy) + bot * dy).round().clamp(0.0, 255.0) as u8;
        }
    }

    true
}
