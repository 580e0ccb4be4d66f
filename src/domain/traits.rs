// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The dataset only needs two things from the outside world:
// a list of sample locations, and a way to decode one of them
// into an RGB f32 image. Programming against ImageSource keeps
// the tiling logic testable with in-memory images.

use image::Rgb32FImage;

use crate::error::Result;

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Anything that can enumerate and decode training images.
///
/// Implementations:
///   - ImageFolderSource → recursive scan of one or more dataroots
///   - (tests) in-memory sources built from generated images
pub trait ImageSource: Send + Sync {
    /// Number of images available
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable location of image `index` (reported as the GT path)
    fn path(&self, index: usize) -> String;

    /// Decode image `index` as RGB with channels in [0, 1].
    /// Failures propagate; callers must not substitute content.
    fn read(&self, index: usize) -> Result<Rgb32FImage>;
}
