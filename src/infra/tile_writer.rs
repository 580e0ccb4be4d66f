// ============================================================
// Layer 6 — Tile Writer
// ============================================================
// Saves PatchTensor tiles as 8-bit PNGs for eyeballing what the
// dataset produces. Values are clamped to [0, 1] and rounded.

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::patch::PatchTensor;

/// Writes tiles into one output directory
pub struct TileWriter {
    dir: PathBuf,
}

impl TileWriter {
    /// Creates the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `patch` as `{dir}/{name}.png` and return the path
    pub fn write(&self, name: &str, patch: &PatchTensor) -> Result<PathBuf> {
        let path = self.dir.join(format!("{name}.png"));
        to_rgb8(patch)?
            .save(&path)
            .with_context(|| format!("Cannot write tile '{}'", path.display()))?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Convert a channel-first patch to an RGB image. Single-channel
/// patches are written as grey.
pub fn to_rgb8(patch: &PatchTensor) -> Result<RgbImage> {
    let [c, h, w] = patch.shape();
    if c != 1 && c != 3 {
        anyhow::bail!("cannot write a {c}-channel tile as RGB");
    }
    let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let channel  = |k: usize| if c == 1 { 0 } else { k };

    Ok(RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([
            quantize(patch.at(channel(0), y, x)),
            quantize(patch.at(channel(1), y, x)),
            quantize(patch.at(channel(2), y, x)),
        ])
    }))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantises_and_clamps() {
        // Channel planes: R = 1.0, G = 0.5, B = -3.0
        let mut data = vec![1.0; 4];
        data.extend(vec![0.5; 4]);
        data.extend(vec![-3.0; 4]);
        let img = to_rgb8(&PatchTensor::new(3, 2, 2, data)).unwrap();
        assert_eq!(img.get_pixel(1, 1), &Rgb([255, 128, 0]));
    }

    #[test]
    fn test_grey_patch() {
        let img = to_rgb8(&PatchTensor::new(1, 1, 2, vec![0.0, 1.0])).unwrap();
        assert_eq!(img.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_rejects_odd_channel_counts() {
        assert!(to_rgb8(&PatchTensor::zeros(2, 2, 2)).is_err());
    }

    #[test]
    fn test_writes_png() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = TileWriter::new(dir.path().join("debug")).unwrap();
        let path   = writer.write("0_HQ_0", &PatchTensor::zeros(3, 4, 4)).unwrap();
        assert!(path.ends_with("0_HQ_0.png"));
        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (4, 4));
    }
}
