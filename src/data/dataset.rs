// ============================================================
// Layer 4 — Multiscale Dataset
// ============================================================
// Reads full-quality images and pulls tiles at regular zoom
// intervals from them. Training only: every fetch re-randomises
// augmentation and crop placement.
//
// Per fetch:
//
//   ImageSource.read ──► PairedResolutionSampler.sample
//        │                 (augment, square crop, cap resize)
//        ▼
//   MultiscalePatchExtractor.extract ──► HQ pyramid (TileTree order)
//        │
//        ▼
//   PairedResolutionSampler.degrade  ──► LQ pyramid (same order)
//
// Burn's DataLoader calls Dataset::get from several worker
// threads. Each call builds its own ChaCha8 generator from the
// dataset seed, the current epoch and the index alone: a sample
// does not depend on which worker fetched it or in what order.
// Callers advance the epoch between passes to re-randomise.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use burn::data::dataset::Dataset;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::data::loader::ImageFolderSource;
use crate::data::pyramid::MultiscalePatchExtractor;
use crate::data::sampler::PairedResolutionSampler;
use crate::domain::patch::PatchTensor;
use crate::domain::tile_tree::TileTree;
use crate::domain::traits::ImageSource;
use crate::error::{CoreError, Result};

// ─── Dataset Options ──────────────────────────────────────────────────────────
/// Options recognised by the multiscale dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiscaleDatasetOptions {
    /// One or more directories scanned recursively for images
    pub dataroot: Vec<PathBuf>,

    /// Side of every emitted high-quality tile
    pub hq_tile_size: u32,

    /// Pyramid levels, root included
    pub num_scales: u32,

    /// HQ → LQ downscale factor (2 → half size)
    pub scale: f64,

    /// Base seed for per-fetch generators
    #[serde(default)]
    pub seed: u64,

    /// Random flips / transpose before cropping
    #[serde(default = "default_augment")]
    pub augment: bool,
}

fn default_augment() -> bool {
    true
}

impl Default for MultiscaleDatasetOptions {
    fn default() -> Self {
        Self {
            dataroot:     vec![PathBuf::from("data/images")],
            hq_tile_size: 128,
            num_scales:   4,
            scale:        2.0,
            seed:         0,
            augment:      true,
        }
    }
}

// ─── MultiscaleSample ─────────────────────────────────────────────────────────
/// One fetched sample: paired pyramids plus where they came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiscaleSample {
    /// Low-quality pyramid, slot-aligned with `hq`
    pub lq: Vec<PatchTensor>,

    /// High-quality pyramid in TileTree order
    pub hq: Vec<PatchTensor>,

    /// Path of the source image
    pub gt_path: String,
}

// ─── MultiscaleDataset ────────────────────────────────────────────────────────
pub struct MultiscaleDataset<S: ImageSource = ImageFolderSource> {
    source:    S,
    sampler:   PairedResolutionSampler,
    extractor: MultiscalePatchExtractor,
    seed:      u64,
    epoch:     AtomicU64,
}

impl MultiscaleDataset<ImageFolderSource> {
    /// Scan the configured dataroots and build the dataset
    pub fn new(opts: &MultiscaleDatasetOptions) -> Result<Self> {
        let source = ImageFolderSource::scan(&opts.dataroot)?;
        Self::with_source(source, opts)
    }
}

impl<S: ImageSource> MultiscaleDataset<S> {
    /// Build over any image source
    pub fn with_source(source: S, opts: &MultiscaleDatasetOptions) -> Result<Self> {
        if opts.num_scales == 0 || opts.hq_tile_size == 0 {
            return Err(CoreError::InvalidConfig(format!(
                "multiscale dataset needs num_scales >= 1 and hq_tile_size >= 1, got {} and {}",
                opts.num_scales, opts.hq_tile_size
            )));
        }
        if source.is_empty() {
            return Err(CoreError::EmptyDataroot("an empty image source".to_string()));
        }
        if !(opts.scale >= 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "LQ scale must be >= 1, got {}",
                opts.scale
            )));
        }

        let sampler   = PairedResolutionSampler::new(opts.hq_tile_size, opts.num_scales, opts.scale, opts.augment);
        let extractor = MultiscalePatchExtractor::new(opts.hq_tile_size, opts.num_scales);

        tracing::info!(
            "Multiscale dataset: {} images, tile={}, scales={}, cap={}, lq_scale={}",
            source.len(),
            opts.hq_tile_size,
            opts.num_scales,
            sampler.hq_size_cap(),
            opts.scale
        );

        Ok(Self { source, sampler, extractor, seed: opts.seed, epoch: AtomicU64::new(0) })
    }

    /// Index tree whose node `i` names pyramid slot `i`
    pub fn tile_tree(&self) -> TileTree {
        TileTree::build(self.extractor.num_scales() as i32 - 1)
    }

    /// Tiles per pyramid
    pub fn pyramid_len(&self) -> usize {
        crate::data::pyramid::PatchPyramid::expected_len(self.extractor.num_scales())
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Relaxed)
    }

    /// Select the epoch later fetches draw their randomness from
    pub fn set_epoch(&self, epoch: u64) {
        self.epoch.store(epoch, Ordering::Relaxed);
    }

    /// Fetch sample `index` using the caller's generator
    pub fn sample<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Result<MultiscaleSample> {
        let index   = index % self.source.len();
        let gt_path = self.source.path(index);

        let full    = self.source.read(index)?;
        let capped  = self.sampler.sample(full, rng);
        let pyramid = self.extractor.extract(&capped)?;

        let hq: Vec<PatchTensor> = pyramid.to_patches();
        let lq: Vec<PatchTensor> = hq.iter().map(|p| self.sampler.degrade(p)).collect();

        tracing::debug!("Fetched '{}' → {} tiles", gt_path, hq.len());
        Ok(MultiscaleSample { lq, hq, gt_path })
    }

    /// Fetch in the current epoch, surfacing errors
    pub fn try_get(&self, index: usize) -> Result<MultiscaleSample> {
        self.try_get_in(self.epoch(), index)
    }

    /// Fetch sample `index` as drawn in `epoch`
    pub fn try_get_in(&self, epoch: u64, index: usize) -> Result<MultiscaleSample> {
        let mut rng = self.fetch_rng(epoch, index);
        self.sample(index, &mut rng)
    }

    /// Generator for one (epoch, index) pair; pure in its arguments
    fn fetch_rng(&self, epoch: u64, index: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        rng.set_stream(epoch);
        rng
    }
}

// ─── Burn Dataset Trait Implementation ────────────────────────────────────────
// The DataLoader only sees Option, so a failed read cannot be
// reported as a value. Returning None would silently end the
// epoch early; panicking stops the run with the real cause.
impl<S: ImageSource> Dataset<MultiscaleSample> for MultiscaleDataset<S> {
    fn get(&self, index: usize) -> Option<MultiscaleSample> {
        if index >= self.source.len() {
            return None;
        }
        match self.try_get(index) {
            Ok(sample) => Some(sample),
            Err(e) => {
                tracing::error!("Sample {} could not be built: {}", index, e);
                panic!("multiscale dataset fetch failed for index {index}: {e}");
            }
        }
    }

    fn len(&self) -> usize {
        self.source.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgb32FImage, RgbImage};

    /// In-memory source of generated images
    struct MemorySource {
        images: Vec<Rgb32FImage>,
    }

    impl ImageSource for MemorySource {
        fn len(&self) -> usize {
            self.images.len()
        }

        fn path(&self, index: usize) -> String {
            format!("memory://{index}")
        }

        fn read(&self, index: usize) -> Result<Rgb32FImage> {
            Ok(self.images[index].clone())
        }
    }

    fn opts(tile: u32, scales: u32) -> MultiscaleDatasetOptions {
        MultiscaleDatasetOptions {
            dataroot:     Vec::new(),
            hq_tile_size: tile,
            num_scales:   scales,
            scale:        2.0,
            seed:         11,
            augment:      true,
        }
    }

    fn memory(w: u32, h: u32) -> MemorySource {
        MemorySource {
            images: vec![Rgb32FImage::from_fn(w, h, |x, y| Rgb([x as f32 / w as f32, y as f32 / h as f32, 0.25]))],
        }
    }

    #[test]
    fn test_sample_shapes() {
        let ds     = MultiscaleDataset::with_source(memory(50, 30), &opts(8, 3)).unwrap();
        let sample = ds.get(0).unwrap();

        assert_eq!(sample.hq.len(), 21);
        assert_eq!(sample.lq.len(), 21);
        assert_eq!(ds.pyramid_len(), 21);
        assert_eq!(ds.tile_tree().len(), 21);
        assert!(sample.hq.iter().all(|p| p.shape() == [3, 8, 8]));
        assert!(sample.lq.iter().all(|p| p.shape() == [3, 4, 4]));
        assert_eq!(sample.gt_path, "memory://0");
    }

    #[test]
    fn test_out_of_range_is_none() {
        let ds = MultiscaleDataset::with_source(memory(16, 16), &opts(4, 2)).unwrap();
        assert_eq!(ds.len(), 1);
        assert!(ds.get(1).is_none());
    }

    #[test]
    fn test_same_generator_same_sample() {
        let ds = MultiscaleDataset::with_source(memory(40, 20), &opts(4, 2)).unwrap();
        let a  = ds.sample(0, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let b  = ds.sample(0, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert_eq!(a.hq, b.hq);
    }

    #[test]
    fn test_fetch_generators_follow_epoch() {
        let ds = MultiscaleDataset::with_source(memory(16, 16), &opts(4, 2)).unwrap();
        let first = ds.fetch_rng(0, 0).gen::<u64>();
        assert_eq!(ds.fetch_rng(0, 0).gen::<u64>(), first);
        assert_ne!(ds.fetch_rng(1, 0).gen::<u64>(), first);
        assert_ne!(ds.fetch_rng(0, 1).gen::<u64>(), first);
    }

    #[test]
    fn test_fetch_order_does_not_change_samples() {
        let two = || MemorySource {
            images: vec![
                Rgb32FImage::from_fn(60, 36, |x, y| Rgb([x as f32 / 60.0, y as f32 / 36.0, 0.5])),
                Rgb32FImage::from_fn(44, 70, |x, y| Rgb([y as f32 / 70.0, 0.1, x as f32 / 44.0])),
            ],
        };
        let mut o = opts(4, 2);
        o.seed = 7;
        let a = MultiscaleDataset::with_source(two(), &o).unwrap();
        let b = MultiscaleDataset::with_source(two(), &o).unwrap();

        // b serves other fetches first, a does not
        let _ = b.get(0).unwrap();
        let _ = b.get(1).unwrap();
        assert_eq!(a.get(1).unwrap().hq, b.get(1).unwrap().hq);

        a.set_epoch(3);
        b.set_epoch(3);
        let _ = a.get(0).unwrap();
        assert_eq!(a.get(1).unwrap().hq, b.try_get_in(3, 1).unwrap().hq);
        assert_eq!(b.epoch(), 3);
    }

    #[test]
    fn test_empty_source_rejected() {
        let source = ImageFolderSource::from_paths(Vec::new());
        let err    = MultiscaleDataset::with_source(source, &opts(4, 2)).err().unwrap();
        assert!(matches!(err, CoreError::EmptyDataroot(_)));
    }

    #[test]
    fn test_zero_scales_rejected() {
        let err = MultiscaleDataset::with_source(memory(16, 16), &opts(4, 0)).err().unwrap();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_folder_dataset_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(24, 40, Rgb([10, 200, 30]))
            .save(dir.path().join("sample.png"))
            .unwrap();

        let mut o = opts(4, 2);
        o.dataroot = vec![dir.path().to_path_buf()];
        let ds = MultiscaleDataset::new(&o).unwrap();
        let sample = ds.try_get(0).unwrap();
        assert_eq!(sample.hq.len(), 5);
        assert!(sample.gt_path.ends_with("sample.png"));
        // Flat colour survives every resize
        assert!((sample.hq[3].at(1, 2, 2) - 200.0 / 255.0).abs() < 1e-4);
    }

    #[test]
    #[should_panic]
    fn test_unreadable_image_panics_in_loader_path() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let source = ImageFolderSource::from_paths(vec![path]);
        let ds     = MultiscaleDataset::with_source(source, &opts(4, 2)).unwrap();
        let _      = ds.get(0);
    }
}
