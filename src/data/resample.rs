// ============================================================
// Layer 4 — Resampling Helpers
// ============================================================
// The three resizes the multiscale pipeline needs:
//
//   area_resize         → shrink a tile to the working size.
//                         Exact box averaging when the source is
//                         an integer multiple of the target (always
//                         the case inside the pyramid), otherwise a
//                         triangle filter that widens with the ratio.
//                         The triangle path only approximates area
//                         interpolation and can differ from it by a
//                         few levels near sharp edges.
//
//   bilinear_downscale  → derive the low-quality companion of a
//                         patch. Half-pixel-centred bilinear sampling
//                         with no antialiasing, so a factor of 2
//                         averages each 2x2 block.
//
//   to_patch            → HWC image → CHW PatchTensor.

use image::{imageops, imageops::FilterType, Rgb, Rgb32FImage};

use crate::domain::patch::PatchTensor;

/// Resize with area semantics; exact for integer shrinks, approximate otherwise
pub fn area_resize(img: &Rgb32FImage, width: u32, height: u32) -> Rgb32FImage {
    let (src_w, src_h) = img.dimensions();
    if (src_w, src_h) == (width, height) {
        return img.clone();
    }

    let integer_shrink = width > 0
        && height > 0
        && src_w % width == 0
        && src_h % height == 0
        && src_w >= width
        && src_h >= height;

    if integer_shrink {
        box_downscale(img, src_w / width, src_h / height)
    } else {
        imageops::resize(img, width, height, FilterType::Triangle)
    }
}

/// Average every `fx` x `fy` block into one pixel
fn box_downscale(img: &Rgb32FImage, fx: u32, fy: u32) -> Rgb32FImage {
    let (src_w, src_h) = img.dimensions();
    let (dst_w, dst_h) = (src_w / fx, src_h / fy);
    let norm = 1.0 / (fx * fy) as f32;

    Rgb32FImage::from_fn(dst_w, dst_h, |x, y| {
        let mut acc = [0.0f32; 3];
        for dy in 0..fy {
            for dx in 0..fx {
                let px = img.get_pixel(x * fx + dx, y * fy + dy);
                for c in 0..3 {
                    acc[c] += px[c];
                }
            }
        }
        Rgb([acc[0] * norm, acc[1] * norm, acc[2] * norm])
    })
}

/// Downscale a patch by `scale` (2.0 → half size) with bilinear sampling.
///
/// Output side is `floor(side / scale)`. Source coordinates are
/// `(dst + 0.5) * scale - 0.5`, clamped at the border.
pub fn bilinear_downscale(patch: &PatchTensor, scale: f64) -> PatchTensor {
    let out_h = ((patch.height as f64) / scale).floor() as usize;
    let out_w = ((patch.width as f64) / scale).floor() as usize;

    let rows: Vec<(usize, usize, f32)> = (0..out_h).map(|y| source_taps(y, scale, patch.height)).collect();
    let cols: Vec<(usize, usize, f32)> = (0..out_w).map(|x| source_taps(x, scale, patch.width)).collect();

    let mut data = Vec::with_capacity(patch.channels * out_h * out_w);
    for c in 0..patch.channels {
        for &(y0, y1, ly) in &rows {
            for &(x0, x1, lx) in &cols {
                let top    = patch.at(c, y0, x0) * (1.0 - lx) + patch.at(c, y0, x1) * lx;
                let bottom = patch.at(c, y1, x0) * (1.0 - lx) + patch.at(c, y1, x1) * lx;
                data.push(top * (1.0 - ly) + bottom * ly);
            }
        }
    }

    PatchTensor::new(patch.channels, out_h, out_w, data)
}

/// Neighbouring source indices and the weight of the second one
fn source_taps(dst: usize, scale: f64, len: usize) -> (usize, usize, f32) {
    let src  = ((dst as f64 + 0.5) * scale - 0.5).max(0.0);
    let i0   = (src.floor() as usize).min(len - 1);
    let i1   = (i0 + 1).min(len - 1);
    let frac = (src - i0 as f64) as f32;
    (i0, i1, frac)
}

/// HWC RGB image → CHW PatchTensor
pub fn to_patch(img: &Rgb32FImage) -> PatchTensor {
    let (w, h) = img.dimensions();
    let (w, h) = (w as usize, h as usize);
    let raw    = img.as_raw();

    let mut data = Vec::with_capacity(3 * w * h);
    for c in 0..3 {
        data.extend((0..w * h).map(|i| raw[i * 3 + c]));
    }
    PatchTensor::new(3, h, w, data)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> Rgb32FImage {
        Rgb32FImage::from_fn(w, h, |x, y| {
            let v = (y * w + x) as f32;
            Rgb([v, v * 2.0, 0.5])
        })
    }

    #[test]
    fn test_area_resize_integer_factor_is_box_average() {
        let img = gradient(4, 4);
        let out = area_resize(&img, 2, 2);
        assert_eq!(out.dimensions(), (2, 2));
        // Top-left block holds 0, 1, 4, 5
        assert!((out.get_pixel(0, 0)[0] - 2.5).abs() < 1e-6);
        // Bottom-right block holds 10, 11, 14, 15
        assert!((out.get_pixel(1, 1)[0] - 12.5).abs() < 1e-6);
        assert!((out.get_pixel(1, 1)[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_area_resize_same_size_is_identity() {
        let img = gradient(3, 5);
        assert_eq!(area_resize(&img, 3, 5).as_raw(), img.as_raw());
    }

    #[test]
    fn test_area_resize_non_integer_ratio_hits_target() {
        let img = gradient(10, 7);
        let out = area_resize(&img, 4, 4);
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn test_bilinear_half_averages_blocks() {
        let data: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let p   = PatchTensor::new(1, 4, 4, data);
        let out = bilinear_downscale(&p, 2.0);
        assert_eq!(out.shape(), [1, 2, 2]);
        assert!((out.at(0, 0, 0) - 2.5).abs() < 1e-6);
        assert!((out.at(0, 0, 1) - 4.5).abs() < 1e-6);
        assert!((out.at(0, 1, 0) - 10.5).abs() < 1e-6);
    }

    #[test]
    fn test_bilinear_floors_odd_sizes() {
        let p   = PatchTensor::zeros(3, 5, 7);
        let out = bilinear_downscale(&p, 2.0);
        assert_eq!(out.shape(), [3, 2, 3]);
    }

    #[test]
    fn test_to_patch_is_channel_first() {
        let img = gradient(2, 2);
        let p   = to_patch(&img);
        assert_eq!(p.shape(), [3, 2, 2]);
        assert_eq!(p.plane(0), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(p.plane(1), &[0.0, 2.0, 4.0, 6.0]);
        assert_eq!(p.plane(2), &[0.5, 0.5, 0.5, 0.5]);
    }
}
