// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from image files on disk to device-ready tensor
// batches.
//
// The pipeline flows in this order:
//
//   dataroot directories
//       │
//       ▼
//   ImageFolderSource          → discovers and decodes images
//       │
//       ▼
//   PairedResolutionSampler    → augment, square crop, cap resize
//       │
//       ▼
//   MultiscalePatchExtractor   → pre-order tile pyramid
//       │
//       ▼
//   MultiscaleDataset          → implements Burn's Dataset trait,
//       │                        pairs HQ tiles with LQ companions
//       ▼
//   MultiscaleBatcher          → stacks each pyramid slot into a batch
//       │
//       ▼
//   DataLoader                 → feeds batches to the training loop
//
// Each module is responsible for exactly one step.

/// Recursive image discovery and decoding
pub mod loader;

/// Area / bilinear resizes and HWC → CHW conversion
pub mod resample;

/// Augmentation, square cropping and LQ derivation
pub mod sampler;

/// Recursive quadrant tiling into a patch pyramid
pub mod pyramid;

/// Implements Burn's Dataset trait for multiscale samples
pub mod dataset;

/// Implements Burn's Batcher trait for pyramids
pub mod batcher;

/// Mode name → dataset constructor
pub mod registry;
