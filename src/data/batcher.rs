// ============================================================
// Layer 4 — Multiscale Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<MultiscaleSample>
// into device tensors.
//
// Every sample carries a pyramid of P tiles. The batch keeps the
// pyramid structure and stacks across samples per slot:
//
//   Input:  N samples × P tiles of shape [C, H, W]
//   Output: P tensors of shape [N, C, H, W]   (for both HQ and LQ)
//
// so slot i of every sample lands in hq[i], matching the slot
// numbering of TileTree.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::MultiscaleSample;
use crate::domain::patch::PatchTensor;

// ─── MultiscaleBatch ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct MultiscaleBatch<B: Backend> {
    /// One [N, C, H/scale, W/scale] tensor per pyramid slot
    pub lq: Vec<Tensor<B, 4>>,

    /// One [N, C, H, W] tensor per pyramid slot
    pub hq: Vec<Tensor<B, 4>>,

    /// Source path of each sample, in batch order
    pub gt_paths: Vec<String>,
}

// ─── MultiscaleBatcher ────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct MultiscaleBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> MultiscaleBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack slot `slot` of every pyramid into one tensor
    fn stack_slot<'a>(&self, pyramids: impl Iterator<Item = &'a [PatchTensor]>, slot: usize) -> Tensor<B, 4> {
        let patches: Vec<&PatchTensor> = pyramids.map(|p| &p[slot]).collect();
        let [c, h, w] = patches[0].shape();
        let flat: Vec<f32> = patches.iter().flat_map(|p| p.data.iter().copied()).collect();

        Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device).reshape([patches.len(), c, h, w])
    }
}

impl<B: Backend> Batcher<MultiscaleSample, MultiscaleBatch<B>> for MultiscaleBatcher<B> {
    fn batch(&self, items: Vec<MultiscaleSample>) -> MultiscaleBatch<B> {
        let slots = items[0].hq.len();

        let hq = (0..slots)
            .map(|slot| self.stack_slot(items.iter().map(|s| s.hq.as_slice()), slot))
            .collect();
        let lq = (0..slots)
            .map(|slot| self.stack_slot(items.iter().map(|s| s.lq.as_slice()), slot))
            .collect();
        let gt_paths = items.iter().map(|s| s.gt_path.clone()).collect();

        MultiscaleBatch { lq, hq, gt_paths }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn sample(fill: f32, path: &str) -> MultiscaleSample {
        let hq = (0..5).map(|_| PatchTensor::new(3, 4, 4, vec![fill; 48])).collect();
        let lq = (0..5).map(|_| PatchTensor::new(3, 2, 2, vec![fill; 12])).collect();
        MultiscaleSample { lq, hq, gt_path: path.to_string() }
    }

    #[test]
    fn test_batch_stacks_per_slot() {
        let batcher = MultiscaleBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(0.0, "a"), sample(1.0, "b")]);

        assert_eq!(batch.hq.len(), 5);
        assert_eq!(batch.lq.len(), 5);
        assert_eq!(batch.hq[2].dims(), [2, 3, 4, 4]);
        assert_eq!(batch.lq[4].dims(), [2, 3, 2, 2]);
        assert_eq!(batch.gt_paths, vec!["a".to_string(), "b".to_string()]);

        // Second sample's values follow the first's
        let values: Vec<f32> = batch.hq[0].clone().into_data().to_vec::<f32>().unwrap();
        assert_eq!(values[0], 0.0);
        assert_eq!(values[48], 1.0);
    }
}
