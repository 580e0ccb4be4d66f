// ============================================================
// Layer 4 — Multiscale Patch Extractor
// ============================================================
// Turns one square, capped-size image into a pyramid of
// equally sized tiles, each a progressively smaller region.
//
//   slot 0            → the whole image shrunk to tile_size
//   slots 1..=4       → its quadrants TL, TR, BL, BR
//   slots 5..=8       → the quadrants of slot 1 (TL)
//   slots 9..=12      → the quadrants of slot 5 ... and so on
//
// The recursion appends a node's four resized quadrants before
// descending into the *full-resolution* quadrants in the same
// order, which is exactly the numbering TileTree hands out. So
// for any leaf, TileTree::path_to_root lists the pyramid slots
// of the same region at every zoom level.
//
// Recursion starts at depth 1 and stops at `num_scales`, giving
//   len = 1 + 4 + … + 4^(num_scales-1) = (4^num_scales - 1) / 3
//   num_scales = 1 → 1, 2 → 5, 3 → 21, 4 → 85

use image::{imageops, Rgb32FImage};

use crate::data::resample::{area_resize, to_patch};
use crate::domain::patch::PatchTensor;
use crate::error::{CoreError, Result};

// ─── PatchPyramid ─────────────────────────────────────────────────────────────
/// Tiles of one sample in TileTree (pre-order) order
#[derive(Debug, Clone)]
pub struct PatchPyramid {
    tiles: Vec<Rgb32FImage>,
}

impl PatchPyramid {
    /// Slot count produced for `num_scales`
    pub fn expected_len(num_scales: u32) -> usize {
        (0..num_scales).map(|level| 4usize.pow(level)).sum()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Rgb32FImage> {
        self.tiles.get(slot)
    }

    pub fn tiles(&self) -> &[Rgb32FImage] {
        &self.tiles
    }

    /// Convert every tile to a CHW tensor, keeping slot order
    pub fn to_patches(&self) -> Vec<PatchTensor> {
        self.tiles.iter().map(to_patch).collect()
    }
}

// ─── MultiscalePatchExtractor ─────────────────────────────────────────────────
#[derive(Debug, Clone, Copy)]
pub struct MultiscalePatchExtractor {
    tile_size:  u32,
    num_scales: u32,
}

impl MultiscalePatchExtractor {
    pub fn new(tile_size: u32, num_scales: u32) -> Self {
        Self { tile_size, num_scales }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn num_scales(&self) -> u32 {
        self.num_scales
    }

    /// Build the pyramid for one square image.
    ///
    /// Every split must land on exact quadrants; the dataset's capped
    /// side `tile_size * 2^num_scales` always satisfies this.
    pub fn extract(&self, full: &Rgb32FImage) -> Result<PatchPyramid> {
        let (w, h) = full.dimensions();
        if w != h {
            return Err(CoreError::NotSquare { width: w, height: h });
        }

        let mut tiles = Vec::with_capacity(PatchPyramid::expected_len(self.num_scales));
        tiles.push(area_resize(full, self.tile_size, self.tile_size));
        self.recurse(full, &mut tiles, 1)?;

        tracing::debug!("Extracted {} tiles from a {}x{} image", tiles.len(), w, h);
        Ok(PatchPyramid { tiles })
    }

    fn recurse(&self, img: &Rgb32FImage, tiles: &mut Vec<Rgb32FImage>, depth: u32) -> Result<()> {
        if depth >= self.num_scales {
            return Ok(());
        }

        let quadrants = split_quadrants(img)?;
        tiles.extend(
            quadrants
                .iter()
                .map(|q| area_resize(q, self.tile_size, self.tile_size)),
        );
        for q in &quadrants {
            self.recurse(q, tiles, depth + 1)?;
        }
        Ok(())
    }
}

/// Cut an image at its midpoints into TL, TR, BL, BR
fn split_quadrants(img: &Rgb32FImage) -> Result<[Rgb32FImage; 4]> {
    let (w, h) = img.dimensions();
    if w % 2 != 0 || h % 2 != 0 || w == 0 || h == 0 {
        return Err(CoreError::UnevenTile { width: w, height: h });
    }
    let (hw, hh) = (w / 2, h / 2);
    Ok([
        imageops::crop_imm(img, 0, 0, hw, hh).to_image(),
        imageops::crop_imm(img, hw, 0, hw, hh).to_image(),
        imageops::crop_imm(img, 0, hh, hw, hh).to_image(),
        imageops::crop_imm(img, hw, hh, hw, hh).to_image(),
    ])
}
