// ============================================================
// Layer 4 — Paired Resolution Sampler
// ============================================================
// Prepares one source image for pyramid extraction, and derives
// the low-quality companion of every extracted patch.
//
// Per sample:
//
//   1. Augment        random h-flip, v-flip and transpose (p = 0.5 each)
//   2. Square crop    keep the short side; slide the crop window along
//                     the long side around its centre
//   3. Cap            area-resize to tile_size * 2^num_scales
//
// Crop placement:
//   diff   = |h - w|,  center = diff / 2
//   offset ~ Normal(0, 0.3) clamped to [-1, 1]
//   shift  = floor(center + offset * (center - 2)), kept inside [0, diff]
//
// Most crops land near the middle; the tails still reach the edges
// occasionally so off-centre content is not starved.
//
// All randomness comes from the caller's generator so worker
// processes can be seeded independently.

use image::{imageops, Rgb32FImage};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::data::resample::{area_resize, bilinear_downscale};
use crate::domain::patch::PatchTensor;

/// Standard deviation of the crop offset draw
const CROP_JITTER_STD: f64 = 0.3;

#[derive(Debug, Clone, Copy)]
pub struct PairedResolutionSampler {
    tile_size:  u32,
    num_scales: u32,
    /// Downscale factor between a high- and low-quality patch
    scale:      f64,
    augment:    bool,
}

impl PairedResolutionSampler {
    pub fn new(tile_size: u32, num_scales: u32, scale: f64, augment: bool) -> Self {
        Self { tile_size, num_scales, scale, augment }
    }

    /// Side of the square every sample is resized to
    pub fn hq_size_cap(&self) -> u32 {
        self.tile_size << self.num_scales
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Augment, square and cap one image
    pub fn sample<R: Rng + ?Sized>(&self, img: Rgb32FImage, rng: &mut R) -> Rgb32FImage {
        let img    = if self.augment { augment(img, rng) } else { img };
        let offset = crop_offset(rng);
        let square = square_crop(&img, offset);
        let cap    = self.hq_size_cap();
        area_resize(&square, cap, cap)
    }

    /// Low-quality companion of a high-quality patch
    pub fn degrade(&self, patch: &PatchTensor) -> PatchTensor {
        bilinear_downscale(patch, self.scale)
    }
}

/// Draw the crop offset: N(0, 0.3) clamped to [-1, 1]
pub fn crop_offset<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let draw: f64 = rng.sample(StandardNormal);
    (draw * CROP_JITTER_STD).clamp(-1.0, 1.0)
}

/// Start of the crop window along the long axis
pub fn crop_start(diff: u32, offset: f64) -> u32 {
    let center = (diff / 2) as f64;
    let shift  = (center + offset * (center - 2.0)).floor();
    shift.clamp(0.0, diff as f64) as u32
}

/// Crop the long axis down to the short one, starting at `crop_start`
pub fn square_crop(img: &Rgb32FImage, offset: f64) -> Rgb32FImage {
    let (w, h) = img.dimensions();
    if w == h {
        return img.clone();
    }

    if h > w {
        let top = crop_start(h - w, offset);
        imageops::crop_imm(img, 0, top, w, w).to_image()
    } else {
        let left = crop_start(w - h, offset);
        imageops::crop_imm(img, left, 0, h, h).to_image()
    }
}

/// Random h-flip, v-flip and transpose
pub fn augment<R: Rng + ?Sized>(img: Rgb32FImage, rng: &mut R) -> Rgb32FImage {
    let hflip     = rng.gen_bool(0.5);
    let vflip     = rng.gen_bool(0.5);
    let transpose = rng.gen_bool(0.5);

    let mut img = img;
    if hflip {
        img = imageops::flip_horizontal(&img);
    }
    if vflip {
        img = imageops::flip_vertical(&img);
    }
    if transpose {
        // Clockwise quarter turn followed by a mirror swaps the axes
        img = imageops::flip_horizontal(&imageops::rotate90(&img));
    }
    img
}
