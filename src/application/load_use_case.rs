// ============================================================
// Layer 2 — LoadUseCase
// ============================================================
// Drives the multiscale dataset through Burn's DataLoader the
// way a training loop would, and reports what comes out:
//
//   Step 1: Build the named dataset                (Layer 4)
//   Step 2: DataLoaderBuilder with the batcher     (Layer 4)
//           (shuffled, several worker threads)
//   Step 3: Pull up to `max_batches` batches and
//           record their slot shapes
//
// Useful for checking dataroot throughput. Crops depend only on
// the seed, the epoch and the sample index, never on the worker.

use anyhow::{Context, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};
use std::path::PathBuf;

use crate::data::{batcher::MultiscaleBatcher, registry::create_dataset};
use crate::infra::options::OptionsStore;

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub options:     Option<PathBuf>,
    pub dataset:     String,
    pub batch_size:  usize,
    pub num_workers: usize,
    pub max_batches: usize,
    pub seed:        u64,
    /// Epoch the crops and augmentations are drawn for
    pub epoch:       u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub batches:  usize,
    pub samples:  usize,
    /// Pyramid slots per batch
    pub slots:    usize,
    /// [N, C, H, W] of the first HQ slot of the first batch
    pub hq_shape: [usize; 4],
    pub lq_shape: [usize; 4],
}

pub struct LoadUseCase {
    config: LoadConfig,
}

impl LoadUseCase {
    pub fn new(config: LoadConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<LoadReport> {
        let cfg = &self.config;

        // ── Step 1: Dataset ───────────────────────────────────────────────────
        let opts    = OptionsStore::load_or_default(cfg.options.as_deref())?;
        let entry   = opts.dataset(&cfg.dataset)?;
        let dataset = create_dataset(entry.mode, &entry.options)
            .with_context(|| format!("Cannot build dataset '{}'", cfg.dataset))?;
        dataset.set_epoch(cfg.epoch);

        // ── Step 2: Loader ────────────────────────────────────────────────────
        let batcher = MultiscaleBatcher::<B>::new(device.clone());
        let loader  = DataLoaderBuilder::new(batcher)
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed)
            .num_workers(cfg.num_workers)
            .build(dataset);

        // ── Step 3: Drain ─────────────────────────────────────────────────────
        let mut report = LoadReport { batches: 0, samples: 0, slots: 0, hq_shape: [0; 4], lq_shape: [0; 4] };
        for batch in loader.iter().take(cfg.max_batches) {
            if report.batches == 0 {
                report.slots    = batch.hq.len();
                report.hq_shape = batch.hq[0].dims();
                report.lq_shape = batch.lq[0].dims();
            }
            report.batches += 1;
            report.samples += batch.gt_paths.len();
            tracing::debug!("Batch {}: {} samples", report.batches, batch.gt_paths.len());
        }

        tracing::info!(
            "Loaded {} batches ({} samples, {} slots each)",
            report.batches,
            report.samples,
            report.slots
        );
        Ok(report)
    }
}
