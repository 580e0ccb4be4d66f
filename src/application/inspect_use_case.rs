// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Dumps what the multiscale dataset produces so tiling can be
// checked by eye:
//
//   Step 1: Load options and build the named dataset  (Layer 6, 4)
//   Step 2: Draw a random sample                      (Layer 4)
//   Step 3: Pick a random leaf of the tile tree       (Layer 3)
//   Step 4: Write every tile on its root-ward chain   (Layer 6)
//           as {i}_HQ_{depth}.png, depth 0 = the leaf
//
// Repeated `count` times.

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

use crate::data::registry::create_dataset;
use crate::domain::tile_tree::ROOT_INDEX;
use crate::infra::{options::OptionsStore, tile_writer::TileWriter};

#[derive(Debug, Clone)]
pub struct InspectConfig {
    pub options: Option<PathBuf>,
    pub dataset: String,
    pub count:   usize,
    pub out_dir: PathBuf,
    pub seed:    u64,
    /// Also write the low-quality companions
    pub with_lq: bool,
}

pub struct InspectUseCase {
    config: InspectConfig,
}

impl InspectUseCase {
    pub fn new(config: InspectConfig) -> Self {
        Self { config }
    }

    /// Returns the paths written, in order
    pub fn execute(&self) -> Result<Vec<PathBuf>> {
        let cfg = &self.config;

        // ── Step 1: Dataset ───────────────────────────────────────────────────
        let opts    = OptionsStore::load_or_default(cfg.options.as_deref())?;
        let entry   = opts.dataset(&cfg.dataset)?;
        let dataset = create_dataset(entry.mode, &entry.options)
            .with_context(|| format!("Cannot build dataset '{}'", cfg.dataset))?;
        let tree    = dataset.tile_tree();
        let writer  = TileWriter::new(&cfg.out_dir)?;

        tracing::info!(
            "Inspecting {} samples of '{}' ({} images, {} tiles each) into '{}'",
            cfg.count,
            cfg.dataset,
            burn::data::dataset::Dataset::len(&dataset),
            dataset.pyramid_len(),
            writer.dir().display()
        );

        let mut rng     = ChaCha8Rng::seed_from_u64(cfg.seed);
        let mut written = Vec::new();
        let total       = burn::data::dataset::Dataset::len(&dataset);

        for i in 0..cfg.count {
            // ── Step 2: Sample ────────────────────────────────────────────────
            let index  = rng.gen_range(0..total);
            let sample = dataset.sample(index, &mut rng)?;

            // ── Step 3: Leaf ──────────────────────────────────────────────────
            // A single-scale tree has no leaves; its root stands in
            let leaves = tree.leaves();
            let leaf   = if leaves.is_empty() { ROOT_INDEX } else { leaves[rng.gen_range(0..leaves.len())] };

            // ── Step 4: Chain ─────────────────────────────────────────────────
            for (depth, slot) in tree.path_to_root(leaf).into_iter().enumerate() {
                written.push(writer.write(&format!("{i}_HQ_{depth}"), &sample.hq[slot])?);
                if cfg.with_lq {
                    written.push(writer.write(&format!("{i}_LQ_{depth}"), &sample.lq[slot])?);
                }
            }
            tracing::debug!("Sample {} from '{}' via leaf {}", i, sample.gt_path, leaf);
        }

        Ok(written)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::options::{ExperimentOptions, DEFAULT_DATASET};
    use image::{Rgb, RgbImage};

    #[test]
    fn test_writes_chain_per_sample() {
        let dir    = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8 * 4, y as u8 * 5, 90]))
            .save(images.join("a.png"))
            .unwrap();

        let mut opts = ExperimentOptions::default();
        {
            let entry = opts.datasets.get_mut(DEFAULT_DATASET).unwrap();
            entry.options.dataroot     = vec![images];
            entry.options.hq_tile_size = 8;
            entry.options.num_scales   = 3;
        }
        let options_path = dir.path().join("opts.json");
        OptionsStore::new(&options_path).save(&opts).unwrap();

        let out = dir.path().join("debug");
        let written = InspectUseCase::new(InspectConfig {
            options: Some(options_path),
            dataset: DEFAULT_DATASET.to_string(),
            count:   2,
            out_dir: out.clone(),
            seed:    9,
            with_lq: true,
        })
        .execute()
        .unwrap();

        // 3 scales → leaf, parent, root; HQ and LQ each
        assert_eq!(written.len(), 2 * 3 * 2);
        assert!(out.join("0_HQ_0.png").exists());
        assert!(out.join("1_HQ_2.png").exists());
        assert!(out.join("1_LQ_2.png").exists());
        let lq = image::open(out.join("0_LQ_1.png")).unwrap();
        assert_eq!(lq.width(), 4);
    }
}
